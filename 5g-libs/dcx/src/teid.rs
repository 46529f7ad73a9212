use serde::Deserialize;

/// Tunnel endpoint identifier of one DC flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub struct Teid(pub u32);

impl From<u32> for Teid {
    fn from(teid: u32) -> Self {
        Teid(teid)
    }
}

impl From<[u8; 4]> for Teid {
    fn from(bytes: [u8; 4]) -> Self {
        Teid(u32::from_be_bytes(bytes))
    }
}

impl std::fmt::Display for Teid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
