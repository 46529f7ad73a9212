use crate::{EndpointId, Imsi, Lcid};
use dcx::{EncodeError, Teid};
use thiserror::Error;

/// Errors in how the DC node has been set up or driven.  These indicate a wiring bug rather
/// than a transient condition, so callers treat them as fatal.
#[derive(Error, Debug)]
pub enum DcxError {
    #[error("Mapping for remote IMSI {0} is already known")]
    DuplicatePeer(Imsi),
    #[error("Mapping for local endpoint {0} is already known")]
    DuplicateEndpointBinding(EndpointId),
    #[error("Missing interface for target IMSI {0}")]
    UnknownPeer(Imsi),
    #[error("Missing local and remote IMSI for endpoint {0}")]
    UnknownEndpoint(EndpointId),
    #[error("TEID {0} already in the forwarding suppression table")]
    TeidAlreadySuppressed(Teid),
    #[error("TEID {0} not in the forwarding suppression table")]
    TeidNotSuppressed(Teid),
    #[error("Remote path selected for LCID {0} but no tunnel is configured")]
    NoTunnelProvider(Lcid),
    #[error("Bearer on LCID {0} has been released")]
    BearerReleased(Lcid),
    #[error("No bearer on LCID {0}")]
    UnknownBearer(Lcid),
    #[error("LCID {0} is already in use")]
    DuplicateLcid(Lcid),
    #[error("Failed to encode control message - {0}")]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}
