mod udp;

pub use udp::UdpEndpointProvider;

use anyhow::Result;
use std::net::SocketAddr;

/// Handle on a bound datagram endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(pub u32);

impl std::fmt::Display for EndpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "endpoint-{}", self.0)
    }
}

/// A datagram received on one of the endpoints of an `EndpointProvider`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub endpoint: EndpointId,
    pub bytes: Vec<u8>,
}

/// Source of datagram endpoints.  Received datagrams are not returned through this trait - each
/// implementation hands them out on a channel of `Datagram`s.
pub trait EndpointProvider {
    fn create_endpoint(&mut self, local_addr: SocketAddr) -> Result<EndpointId>;
    fn send_to(
        &mut self,
        endpoint: EndpointId,
        remote_addr: SocketAddr,
        bytes: &[u8],
    ) -> Result<()>;
    fn close_endpoint(&mut self, endpoint: EndpointId);
}
