mod counters;
mod dc_bearer;
mod dc_relay;
mod path_selector;

pub use counters::{BearerCounters, bearer_counter_indices};
pub use dc_bearer::{BearerPhase, BearerSettings, DcBearer, MIN_SDU_LEN, TunnelParams};
pub use dc_relay::DcRelay;
pub use path_selector::{Path, PathSelector, SplitPolicy};
