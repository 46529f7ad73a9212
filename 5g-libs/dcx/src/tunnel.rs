//! tunnel - DCX-U header, a GTP-U header (TS29.281, 5.1) with the sequence number present
//! and the message type reused to say which side of the split bearer a PDU is for.

#![allow(clippy::unusual_byte_groupings)]
use crate::{DecodeError, EncodeError, Teid};
use num_enum::{IntoPrimitive, TryFromPrimitive};

pub const TUNNEL_HEADER_LEN: usize = 12;
const GTP_BASE_HEADER_LEN: usize = 8;
const GTP_FLAGS: u8 = 0b001_1_0_0_1_0; // version=1, PT=1, R, E=0, S=1, PN=0
const GTP_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum TunnelMessageType {
    /// PDCP PDU on its way to the RLC of the peer UE.
    ForwardDownlinkData = 3,
    /// PDCP PDU received by the peer UE, on its way back to the PDCP that owns the bearer.
    ForwardUplinkData = 4,
    /// Plain UE data.  TS29.281, table 6.1-1.
    GPdu = 255,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunnelHeader {
    pub message_type: TunnelMessageType,
    pub teid: Teid,
}

impl TunnelHeader {
    pub fn encapsulate(&self, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
        // The length covers everything after the mandatory 8 byte part of the header.
        let length = u16::try_from(payload.len() + TUNNEL_HEADER_LEN - GTP_BASE_HEADER_LEN)
            .map_err(|_| EncodeError::PayloadTooLong(payload.len()))?
            .to_be_bytes();
        let teid = self.teid.0.to_be_bytes();

        let mut packet = Vec::with_capacity(TUNNEL_HEADER_LEN + payload.len());
        packet.extend_from_slice(&[
            GTP_FLAGS,
            self.message_type.into(),
            length[0],
            length[1],
            teid[0],
            teid[1],
            teid[2],
            teid[3],
            0, // sequence number
            0,
            0, // N-PDU number
            0, // next extension header type = none
        ]);
        packet.extend_from_slice(payload);
        Ok(packet)
    }

    /// Parse the header, returning it along with the payload that follows it.
    pub fn decapsulate(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        if bytes.len() < TUNNEL_HEADER_LEN {
            return Err(DecodeError::TooShort {
                needed: TUNNEL_HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let version = bytes[0] >> 5;
        if version != GTP_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let message_type = TunnelMessageType::try_from(bytes[1])
            .map_err(|_| DecodeError::UnknownMessageType(bytes[1]))?;
        let declared = u16::from_be_bytes([bytes[2], bytes[3]]) as usize;
        let actual = bytes.len() - GTP_BASE_HEADER_LEN;
        if declared != actual {
            return Err(DecodeError::LengthMismatch { declared, actual });
        }
        let teid = Teid::from([bytes[4], bytes[5], bytes[6], bytes[7]]);

        Ok((
            TunnelHeader { message_type, teid },
            &bytes[TUNNEL_HEADER_LEN..],
        ))
    }
}
