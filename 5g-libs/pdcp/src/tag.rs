use std::time::{Duration, Instant};

/// Sender timestamp carried alongside a PDU (never on the wire), used to
/// measure the delay through the lower layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdcpTag {
    sender_timestamp: Instant,
}

impl PdcpTag {
    pub fn now() -> Self {
        PdcpTag {
            sender_timestamp: Instant::now(),
        }
    }

    pub fn sender_timestamp(&self) -> Instant {
        self.sender_timestamp
    }

    pub fn delay(&self) -> Duration {
        self.sender_timestamp.elapsed()
    }
}
