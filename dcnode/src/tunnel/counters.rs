use atomic_counter::RelaxedCounter;

pub mod dcx_counter_indices {
    pub const RX_CONTROL_DATAGRAMS: usize = 0;
    pub const RX_CONTROL_BYTES: usize = 1;
    pub const RX_DATA_DATAGRAMS: usize = 2;
    pub const RX_DATA_BYTES: usize = 3;
    pub const TX_DATA_DATAGRAMS: usize = 4;
    pub const TX_DATA_BYTES: usize = 5;

    // Everything from here on is a drop or an anomaly.
    pub const FIRST_DROP: usize = 6;
    pub const DROP_UNDECODABLE_CONTROL: usize = 6;
    pub const DROP_UNDECODABLE_DATA: usize = 7;
    pub const DROP_SUPPRESSED: usize = 8;
    pub const DROP_NO_CONSUMER: usize = 9;
    pub const DROP_TX_FAILED: usize = 10;
    pub const NUM_COUNTERS: usize = 11;
}

pub type DcxCounters = [RelaxedCounter; dcx_counter_indices::NUM_COUNTERS];
