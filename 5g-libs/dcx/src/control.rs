//! control - DCX-C messages and their 7 byte header
//!
//! | Offset | Size | Field               |
//! |--------|------|---------------------|
//! | 0      | 1    | message type        |
//! | 1      | 1    | procedure code      |
//! | 2      | 1    | criticality         |
//! | 3      | 1    | length of IEs + 3   |
//! | 4      | 2    | reserved            |
//! | 6      | 1    | number of IEs       |

use crate::{DecodeError, EncodeError};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Deserialize;

pub const CONTROL_HEADER_LEN: usize = 7;
const CRITICALITY_REJECT: u8 = 0;
const IES_LENGTH_OFFSET: u8 = 3;
pub const MAX_IES_LENGTH: usize = (u8::MAX - IES_LENGTH_OFFSET) as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ControlMessageType {
    InitiatingMessage = 0,
    SuccessfulOutcome = 1,
    UnsuccessfulOutcome = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ProcedureCode {
    RrcDcConnectionReconfiguration = 0,
    RrcDcConnectionReconfigurationCompleted = 1,
    NotifyDcConnection = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlHeader {
    pub message_type: u8,
    pub procedure_code: u8,
    length_of_ies: u8,
    pub number_of_ies: u8,
}

impl ControlHeader {
    pub fn new(
        message_type: ControlMessageType,
        procedure_code: ProcedureCode,
        length_of_ies: usize,
        number_of_ies: u8,
    ) -> Result<Self, EncodeError> {
        if length_of_ies > MAX_IES_LENGTH {
            return Err(EncodeError::IesTooLong(length_of_ies));
        }
        Ok(ControlHeader {
            message_type: message_type.into(),
            procedure_code: procedure_code.into(),
            length_of_ies: length_of_ies as u8,
            number_of_ies,
        })
    }

    pub fn length_of_ies(&self) -> usize {
        self.length_of_ies as usize
    }

    pub fn encode(&self) -> [u8; CONTROL_HEADER_LEN] {
        let reserved = 0u16.to_be_bytes();
        [
            self.message_type,
            self.procedure_code,
            CRITICALITY_REJECT,
            self.length_of_ies + IES_LENGTH_OFFSET,
            reserved[0],
            reserved[1],
            self.number_of_ies,
        ]
    }

    /// Parse the header, returning it along with the bytes that follow it.
    pub fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        if bytes.len() < CONTROL_HEADER_LEN {
            return Err(DecodeError::TooShort {
                needed: CONTROL_HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let length_field = bytes[3];
        if length_field < IES_LENGTH_OFFSET {
            return Err(DecodeError::BadIesLength(length_field));
        }
        let header = ControlHeader {
            message_type: bytes[0],
            procedure_code: bytes[1],
            length_of_ies: length_field - IES_LENGTH_OFFSET,
            number_of_ies: bytes[6],
        };
        Ok((header, &bytes[CONTROL_HEADER_LEN..]))
    }
}

/// How the two control messages are told apart on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlFraming {
    /// Each message is preceded by a control header whose procedure code identifies it.
    #[default]
    Tagged,
    /// Bare RRC messages.  A single byte is a completion, anything longer a reconfiguration.
    Legacy,
}

/// RRC connection reconfiguration for the secondary UE.  Its content is opaque here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RrcReconfiguration(pub Vec<u8>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RrcReconfigurationCompleted {
    pub rrc_transaction_identifier: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DcxControlMessage {
    RrcDcConnectionReconfiguration(RrcReconfiguration),
    RrcDcConnectionReconfigurationCompleted(RrcReconfigurationCompleted),
}

impl DcxControlMessage {
    fn body(&self) -> &[u8] {
        match self {
            DcxControlMessage::RrcDcConnectionReconfiguration(r) => &r.0,
            DcxControlMessage::RrcDcConnectionReconfigurationCompleted(c) => {
                std::slice::from_ref(&c.rrc_transaction_identifier)
            }
        }
    }

    fn codes(&self) -> (ControlMessageType, ProcedureCode) {
        match self {
            DcxControlMessage::RrcDcConnectionReconfiguration(_) => (
                ControlMessageType::InitiatingMessage,
                ProcedureCode::RrcDcConnectionReconfiguration,
            ),
            DcxControlMessage::RrcDcConnectionReconfigurationCompleted(_) => (
                ControlMessageType::SuccessfulOutcome,
                ProcedureCode::RrcDcConnectionReconfigurationCompleted,
            ),
        }
    }

    pub fn encode(&self, framing: ControlFraming) -> Result<Vec<u8>, EncodeError> {
        let body = self.body();
        match framing {
            ControlFraming::Legacy => {
                if let DcxControlMessage::RrcDcConnectionReconfiguration(_) = self {
                    if body.len() <= 1 {
                        return Err(EncodeError::AmbiguousLegacyFraming(body.len()));
                    }
                }
                Ok(body.to_vec())
            }
            ControlFraming::Tagged => {
                let (message_type, procedure_code) = self.codes();
                let header = ControlHeader::new(message_type, procedure_code, body.len(), 1)?;
                let mut datagram = Vec::with_capacity(CONTROL_HEADER_LEN + body.len());
                datagram.extend_from_slice(&header.encode());
                datagram.extend_from_slice(body);
                Ok(datagram)
            }
        }
    }

    pub fn decode(bytes: &[u8], framing: ControlFraming) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        match framing {
            ControlFraming::Legacy => Ok(if bytes.len() > 1 {
                DcxControlMessage::RrcDcConnectionReconfiguration(RrcReconfiguration(
                    bytes.to_vec(),
                ))
            } else {
                DcxControlMessage::RrcDcConnectionReconfigurationCompleted(
                    RrcReconfigurationCompleted {
                        rrc_transaction_identifier: bytes[0],
                    },
                )
            }),
            ControlFraming::Tagged => {
                let (header, body) = ControlHeader::decode(bytes)?;
                if header.length_of_ies() != body.len() {
                    return Err(DecodeError::LengthMismatch {
                        declared: header.length_of_ies(),
                        actual: body.len(),
                    });
                }
                match ProcedureCode::try_from(header.procedure_code) {
                    Ok(ProcedureCode::RrcDcConnectionReconfiguration) => Ok(
                        DcxControlMessage::RrcDcConnectionReconfiguration(RrcReconfiguration(
                            body.to_vec(),
                        )),
                    ),
                    Ok(ProcedureCode::RrcDcConnectionReconfigurationCompleted) => {
                        let &[rrc_transaction_identifier] = body else {
                            return Err(DecodeError::LengthMismatch {
                                declared: 1,
                                actual: body.len(),
                            });
                        };
                        Ok(DcxControlMessage::RrcDcConnectionReconfigurationCompleted(
                            RrcReconfigurationCompleted {
                                rrc_transaction_identifier,
                            },
                        ))
                    }
                    Ok(other) => Err(DecodeError::UnsupportedProcedureCode(other.into())),
                    Err(_) => Err(DecodeError::UnknownProcedureCode(header.procedure_code)),
                }
            }
        }
    }
}
