use dcx::Teid;
use pdcp::PdcpTag;

pub type Imsi = u64;
pub type Lcid = u8;

/// A PDU travelling through the DCX tunnel, together with the UEs at either end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UeDataUnit {
    pub source_imsi: Imsi,
    pub target_imsi: Imsi,
    pub teid: Teid,
    pub payload: Vec<u8>,

    // Delay measurement only.  Not sent on the wire.
    pub tag: Option<PdcpTag>,
}

impl std::fmt::Display for UeDataUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}->{},{},{} bytes)",
            self.source_imsi,
            self.target_imsi,
            self.teid,
            self.payload.len()
        )
    }
}
