//! dcnode - a UE node with dual connectivity split bearers over a UE-to-UE DCX tunnel

mod bearer;
mod data;
mod error;
mod node;
mod sap;
mod transport;
mod tunnel;

pub use bearer::{
    BearerCounters, BearerPhase, BearerSettings, DcBearer, DcRelay, MIN_SDU_LEN, Path,
    PathSelector, SplitPolicy, TunnelParams, bearer_counter_indices,
};
pub use data::{
    BearerConfig, Config, Imsi, Lcid, PeerConfig, RelayConfig, UeDataUnit, load_config_file,
};
pub use error::DcxError;
pub use node::UeNode;
pub use sap::{LocalStack, UpperLayer};
pub use transport::{Datagram, EndpointId, EndpointProvider, UdpEndpointProvider};
pub use tunnel::{
    DcxCounters, DcxEvent, PeerEndpoint, Plane, ReceiveBinding, TeidRoutingTable,
    TunnelEndpointTable, UeDcx, dcx_counter_indices,
};
