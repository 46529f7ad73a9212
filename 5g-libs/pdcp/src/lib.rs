//! lib - PDCP data PDU framing and in-sequence delivery for a split bearer

mod pdu;
mod sequence_engine;
mod tag;

pub use pdu::{PDCP_HEADER_LEN, PDCP_SN_MASK, PdcpPdu};
pub use sequence_engine::{MAX_PDCP_SN, PdcpStatus, REORDERING_WINDOW, SequenceEngine};
pub use tag::PdcpTag;
