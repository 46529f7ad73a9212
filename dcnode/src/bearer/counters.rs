use atomic_counter::RelaxedCounter;

pub mod bearer_counter_indices {
    pub const TX_PDUS: usize = 0;
    pub const TX_LOCAL: usize = 1;
    pub const TX_REMOTE: usize = 2;
    pub const RX_PDUS: usize = 3;
    pub const RX_DELAY_MICROS: usize = 4;
    pub const DELIVERED_SDUS: usize = 5;
    pub const FORCED_ADVANCES: usize = 6;

    pub const FIRST_WARN: usize = 7;
    pub const SHORT_SDUS: usize = 7;
    pub const DROP_BAD_PDU: usize = 8;
    pub const NUM_COUNTERS: usize = 9;
}

pub type BearerCounters = [RelaxedCounter; bearer_counter_indices::NUM_COUNTERS];
