use crate::{DcxError, EndpointId, Imsi};
use std::collections::HashMap;
use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    Control,
    UserPlane,
}

/// The local endpoints used to reach one peer UE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerEndpoint {
    pub remote_ip: IpAddr,
    pub control_endpoint: EndpointId,
    pub user_plane_endpoint: EndpointId,
}

/// What arrives on a local endpoint: who it is for, who it is from and which plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveBinding {
    pub local_imsi: Imsi,
    pub remote_imsi: Imsi,
    pub plane: Plane,
}

#[derive(Debug, Default)]
pub struct TunnelEndpointTable {
    peers: HashMap<Imsi, PeerEndpoint>,
    bindings: HashMap<EndpointId, ReceiveBinding>,
}

impl TunnelEndpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer and bindings for both its endpoints.  Nothing is inserted on failure.
    pub fn insert(
        &mut self,
        local_imsi: Imsi,
        remote_imsi: Imsi,
        peer: PeerEndpoint,
    ) -> Result<(), DcxError> {
        if self.peers.contains_key(&remote_imsi) {
            return Err(DcxError::DuplicatePeer(remote_imsi));
        }
        for endpoint in [peer.control_endpoint, peer.user_plane_endpoint] {
            if self.bindings.contains_key(&endpoint) {
                return Err(DcxError::DuplicateEndpointBinding(endpoint));
            }
        }
        if peer.control_endpoint == peer.user_plane_endpoint {
            return Err(DcxError::DuplicateEndpointBinding(peer.user_plane_endpoint));
        }

        for (endpoint, plane) in [
            (peer.control_endpoint, Plane::Control),
            (peer.user_plane_endpoint, Plane::UserPlane),
        ] {
            self.bindings.insert(
                endpoint,
                ReceiveBinding {
                    local_imsi,
                    remote_imsi,
                    plane,
                },
            );
        }
        self.peers.insert(remote_imsi, peer);
        Ok(())
    }

    pub fn contains_peer(&self, remote_imsi: Imsi) -> bool {
        self.peers.contains_key(&remote_imsi)
    }

    pub fn peer(&self, remote_imsi: Imsi) -> Result<&PeerEndpoint, DcxError> {
        self.peers
            .get(&remote_imsi)
            .ok_or(DcxError::UnknownPeer(remote_imsi))
    }

    pub fn binding(&self, endpoint: EndpointId) -> Result<&ReceiveBinding, DcxError> {
        self.bindings
            .get(&endpoint)
            .ok_or(DcxError::UnknownEndpoint(endpoint))
    }

    pub fn endpoints(&self) -> impl Iterator<Item = EndpointId> + '_ {
        self.bindings.keys().copied()
    }
}
