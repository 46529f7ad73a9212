use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Empty datagram")]
    Empty,
    #[error("Too short - {actual} bytes, need at least {needed}")]
    TooShort { needed: usize, actual: usize },
    #[error("Length of IEs field {0} is less than 3")]
    BadIesLength(u8),
    #[error("Length field says {declared} bytes but {actual} are present")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("Unknown procedure code {0}")]
    UnknownProcedureCode(u8),
    #[error("Unsupported procedure code {0}")]
    UnsupportedProcedureCode(u8),
    #[error("Unsupported GTP version {0}")]
    UnsupportedVersion(u8),
    #[error("Unknown tunnel message type {0}")]
    UnknownMessageType(u8),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("IEs of {0} bytes exceed the maximum of {}", crate::MAX_IES_LENGTH)]
    IesTooLong(usize),
    #[error("Reconfiguration of {0} bytes would be read as a completion under legacy framing")]
    AmbiguousLegacyFraming(usize),
    #[error("Payload of {0} bytes does not fit the tunnel header length field")]
    PayloadTooLong(usize),
}
