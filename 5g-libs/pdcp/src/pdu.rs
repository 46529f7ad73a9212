#![allow(clippy::unusual_byte_groupings)]
use anyhow::{Result, ensure};

pub const PDCP_SN_MASK: u16 = 0x0fff; // 12 bits, as per TS38.323, 6.3.2
pub const PDCP_HEADER_LEN: usize = 2;
const PDCP_DC_BIT: u8 = 0b1_000_0000;

/// A PDCP PDU for a DRB with a 12 bit sequence number.  No ciphering or
/// integrity protection is applied, so the SDU follows the header directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdcpPdu(pub Vec<u8>);

impl PdcpPdu {
    /// Encapsulate an SDU in a PDCP Data PDU.
    pub fn new_data(seq_num: u16, sdu: &[u8]) -> Self {
        let seq_num = seq_num & PDCP_SN_MASK;
        let mut pdu = Vec::with_capacity(PDCP_HEADER_LEN + sdu.len());
        pdu.push(PDCP_DC_BIT | ((seq_num >> 8) as u8)); // D/C, R,R,R, SN
        pdu.push((seq_num & 0xff) as u8); // SN
        pdu.extend_from_slice(sdu);
        PdcpPdu(pdu)
    }

    pub fn is_data(&self) -> bool {
        self.0.first().is_some_and(|b| b & PDCP_DC_BIT != 0)
    }

    pub fn seq_num(&self) -> Result<u16> {
        ensure!(self.0.len() >= PDCP_HEADER_LEN, "Too short for PDCP PDU");
        Ok(u16::from_be_bytes([self.0[0], self.0[1]]) & PDCP_SN_MASK)
    }

    /// View the inner packet in a PDCP packet.
    pub fn view_inner(&self) -> Result<&[u8]> {
        ensure!(self.0.len() >= PDCP_HEADER_LEN, "Too short for PDCP PDU");
        Ok(&self.0[PDCP_HEADER_LEN..])
    }

    /// Strip the header, returning the sequence number and the SDU.
    pub fn into_sdu(mut self) -> Result<(u16, Vec<u8>)> {
        ensure!(self.is_data(), "PDCP control PDU not supported");
        let seq_num = self.seq_num()?;
        Ok((seq_num, self.0.split_off(PDCP_HEADER_LEN)))
    }
}

impl From<PdcpPdu> for Vec<u8> {
    fn from(p: PdcpPdu) -> Self {
        p.0
    }
}
