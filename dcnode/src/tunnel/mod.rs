mod counters;
mod endpoint_table;
mod teid_routing;
mod ue_dcx;

pub use counters::{DcxCounters, dcx_counter_indices};
pub use endpoint_table::{PeerEndpoint, Plane, ReceiveBinding, TunnelEndpointTable};
pub use teid_routing::TeidRoutingTable;
pub use ue_dcx::{DcxEvent, UeDcx};
