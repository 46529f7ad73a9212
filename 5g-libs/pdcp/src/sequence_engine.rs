//! sequence_engine - transmit numbering and in-sequence delivery for one bearer
//!
//! The receive side tolerates PDUs arriving out of order when a bearer is split across
//! two paths with different delays.  PDUs ahead of the next expected sequence number are
//! held in a reorder buffer until the gap is filled.  A gap is abandoned (and the buffer
//! flushed in sequence order from rx_sn) when a PDU arrives outside the reordering window,
//! so that a permanently lost PDU cannot stall delivery forever.
//!
//! Duplicates are not detected.  A PDU with a sequence number that has already been
//! delivered falls outside the window, forces `rx_sn` back to it, and is delivered again.

use super::PDCP_SN_MASK;
use std::collections::BTreeMap;

pub const MAX_PDCP_SN: u16 = 4095;
pub const REORDERING_WINDOW: u16 = 2047;

/// The state variables transferred when a bearer moves between nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PdcpStatus {
    pub tx_sn: u16,
    pub rx_sn: u16,
}

#[derive(Debug)]
pub struct SequenceEngine<T> {
    tx_sn: u16,
    rx_sn: u16,
    reorder_buffer: BTreeMap<u16, T>,
    in_sequence_delivery: bool,
    forced_advances: u64,
}

impl<T> SequenceEngine<T> {
    pub fn new(in_sequence_delivery: bool) -> Self {
        SequenceEngine {
            tx_sn: 0,
            rx_sn: 0,
            reorder_buffer: BTreeMap::new(),
            in_sequence_delivery,
            forced_advances: 0,
        }
    }

    /// Return the sequence number for the next transmitted PDU.
    pub fn assign_tx_sn(&mut self) -> u16 {
        let sn = self.tx_sn;
        self.tx_sn = next_sn(sn);
        sn
    }

    /// Process a received PDU, returning the payloads that are now deliverable, in order.
    pub fn on_receive(&mut self, sn: u16, payload: T) -> Vec<T> {
        let sn = sn & PDCP_SN_MASK;
        let mut delivered = Vec::new();

        if !self.in_sequence_delivery {
            self.rx_sn = next_sn(sn);
            delivered.push(payload);
            return delivered;
        }

        while sn != self.rx_sn && outside_window(sn, self.rx_sn) {
            self.forced_advances += 1;
            // Lowest buffered SN counting forwards from rx_sn, allowing for wrap.
            let next = self
                .reorder_buffer
                .range(self.rx_sn..)
                .next()
                .or_else(|| self.reorder_buffer.iter().next());
            let Some((&lowest, _)) = next else {
                self.rx_sn = sn;
                break;
            };
            self.rx_sn = lowest;
            self.unload_reorder_buffer(&mut delivered);
        }

        if sn == self.rx_sn {
            delivered.push(payload);
            self.rx_sn = next_sn(self.rx_sn);
            self.unload_reorder_buffer(&mut delivered);
        } else {
            // First arrival wins if the same SN is buffered twice.
            self.reorder_buffer.entry(sn).or_insert(payload);
        }
        delivered
    }

    // Deliver buffered PDUs starting at rx_sn until the next gap.
    fn unload_reorder_buffer(&mut self, delivered: &mut Vec<T>) {
        while let Some(payload) = self.reorder_buffer.remove(&self.rx_sn) {
            delivered.push(payload);
            self.rx_sn = next_sn(self.rx_sn);
        }
    }

    pub fn tx_sn(&self) -> u16 {
        self.tx_sn
    }

    pub fn rx_sn(&self) -> u16 {
        self.rx_sn
    }

    /// True while PDUs are buffered waiting for a missing one.
    pub fn has_gap(&self) -> bool {
        !self.reorder_buffer.is_empty()
    }

    pub fn buffered(&self) -> usize {
        self.reorder_buffer.len()
    }

    /// Number of times the window was exceeded and rx_sn was moved without the gap being filled.
    pub fn forced_advances(&self) -> u64 {
        self.forced_advances
    }

    pub fn in_sequence_delivery(&self) -> bool {
        self.in_sequence_delivery
    }

    pub fn status(&self) -> PdcpStatus {
        PdcpStatus {
            tx_sn: self.tx_sn,
            rx_sn: self.rx_sn,
        }
    }

    /// Overwrite the state variables.  Any buffered PDUs are left in place.
    pub fn set_status(&mut self, status: PdcpStatus) {
        self.tx_sn = status.tx_sn & PDCP_SN_MASK;
        self.rx_sn = status.rx_sn & PDCP_SN_MASK;
    }
}

fn next_sn(sn: u16) -> u16 {
    if sn >= MAX_PDCP_SN { 0 } else { sn + 1 }
}

// Distance from `from` forwards to `to` in the 12 bit SN space.
fn forward_distance(from: u16, to: u16) -> u16 {
    to.wrapping_sub(from) & PDCP_SN_MASK
}

// A PDU is outside the window if it is more than REORDERING_WINDOW ahead of rx_sn, which
// in modular terms also covers every PDU that is behind rx_sn.
fn outside_window(sn: u16, rx_sn: u16) -> bool {
    forward_distance(rx_sn, sn) > REORDERING_WINDOW
}
