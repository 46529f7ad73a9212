//! ue_dcx - the UE end of the DCX tunnel.  Owns the endpoints to each peer UE and routes
//! arriving PDUs by TEID.

use super::counters::{DcxCounters, dcx_counter_indices::*};
use super::{PeerEndpoint, Plane, TeidRoutingTable, TunnelEndpointTable};
use crate::{DcxError, EndpointId, EndpointProvider, Imsi, Lcid, UeDataUnit};
use atomic_counter::AtomicCounter;
use dcx::{
    ControlFraming, DcxControlMessage, RrcReconfiguration, RrcReconfigurationCompleted, Teid,
    TunnelHeader, TunnelKind, TunnelMessageType,
};
use pdcp::PdcpTag;
use slog::{Logger, debug, info, o, warn};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// The result of processing an inbound datagram, for the owner of the `UeDcx` to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DcxEvent {
    Reconfiguration {
        source_imsi: Imsi,
        target_imsi: Imsi,
        message: RrcReconfiguration,
    },
    ReconfigurationCompleted {
        source_imsi: Imsi,
        target_imsi: Imsi,
        message: RrcReconfigurationCompleted,
    },
    /// Forwarded downlink for the relay on this LCID to send on the local radio link.
    ToRlc { lcid: Lcid, unit: UeDataUnit },
    /// Uplink received by a peer UE, for the PDCP of the bearer on this LCID.
    ToPdcp { lcid: Lcid, unit: UeDataUnit },
    UeData(UeDataUnit),
}

pub struct UeDcx<E: EndpointProvider> {
    imsi: Imsi,
    provider: E,
    endpoints: TunnelEndpointTable,
    routes: TeidRoutingTable,
    tunnel: TunnelKind,
    framing: ControlFraming,
    counters: Arc<DcxCounters>,
    logger: Logger,
}

impl<E: EndpointProvider> UeDcx<E> {
    pub fn new(
        imsi: Imsi,
        provider: E,
        tunnel: TunnelKind,
        framing: ControlFraming,
        logger: &Logger,
    ) -> Self {
        UeDcx {
            imsi,
            provider,
            endpoints: TunnelEndpointTable::new(),
            routes: TeidRoutingTable::new(),
            tunnel,
            framing,
            counters: Arc::new(DcxCounters::default()),
            logger: logger.new(o!("dcx" => imsi)),
        }
    }

    pub fn imsi(&self) -> Imsi {
        self.imsi
    }

    pub fn counters(&self) -> Arc<DcxCounters> {
        self.counters.clone()
    }

    pub fn provider(&self) -> &E {
        &self.provider
    }

    pub fn routes(&self) -> &TeidRoutingTable {
        &self.routes
    }

    pub fn routes_mut(&mut self) -> &mut TeidRoutingTable {
        &mut self.routes
    }

    pub fn endpoint_table(&self) -> &TunnelEndpointTable {
        &self.endpoints
    }

    /// Bind the control and user plane endpoints for talking to `remote_imsi`.
    pub fn add_interface(
        &mut self,
        local_ip: IpAddr,
        remote_imsi: Imsi,
        remote_ip: IpAddr,
    ) -> Result<(), DcxError> {
        if self.endpoints.contains_peer(remote_imsi) {
            return Err(DcxError::DuplicatePeer(remote_imsi));
        }

        let control_endpoint = self
            .provider
            .create_endpoint(SocketAddr::new(local_ip, self.tunnel.control_port()))?;
        let user_plane_endpoint = match self
            .provider
            .create_endpoint(SocketAddr::new(local_ip, self.tunnel.user_plane_port()))
        {
            Ok(endpoint) => endpoint,
            Err(e) => {
                self.provider.close_endpoint(control_endpoint);
                return Err(e.into());
            }
        };

        let peer = PeerEndpoint {
            remote_ip,
            control_endpoint,
            user_plane_endpoint,
        };
        if let Err(e) = self.endpoints.insert(self.imsi, remote_imsi, peer) {
            self.provider.close_endpoint(control_endpoint);
            self.provider.close_endpoint(user_plane_endpoint);
            return Err(e);
        }
        info!(
            self.logger,
            "Added interface {local_ip} -> IMSI {remote_imsi} at {remote_ip} ({control_endpoint}, {user_plane_endpoint})"
        );
        Ok(())
    }

    pub fn add_teid_to_be_forwarded(
        &mut self,
        teid: Teid,
        target_imsi: Imsi,
    ) -> Result<(), DcxError> {
        self.routes.add_suppression(teid, target_imsi)?;
        info!(self.logger, "Suppressing forwarded data on TEID {teid} (target IMSI {target_imsi})");
        Ok(())
    }

    pub fn remove_teid_to_be_forwarded(&mut self, teid: Teid) -> Result<(), DcxError> {
        self.routes.remove_suppression(teid)?;
        info!(self.logger, "Resumed forwarded data on TEID {teid}");
        Ok(())
    }

    /// Send plain UE data to the peer UE named in the unit.
    pub fn send_ue_data(&mut self, unit: UeDataUnit) -> Result<(), DcxError> {
        self.send_data(TunnelMessageType::GPdu, unit)
    }

    /// Send a PDCP PDU to the RLC of the peer UE.
    pub fn send_forward_downlink(&mut self, unit: UeDataUnit) -> Result<(), DcxError> {
        self.send_data(TunnelMessageType::ForwardDownlinkData, unit)
    }

    /// Send a PDCP PDU received on the local radio link back to the UE that owns the bearer.
    pub fn send_forward_uplink(&mut self, unit: UeDataUnit) -> Result<(), DcxError> {
        self.send_data(TunnelMessageType::ForwardUplinkData, unit)
    }

    // A missing peer is a configuration error.  Anything that goes wrong after that is
    // a data plane problem, so the PDU is dropped.
    fn send_data(
        &mut self,
        message_type: TunnelMessageType,
        unit: UeDataUnit,
    ) -> Result<(), DcxError> {
        let peer = *self.endpoints.peer(unit.target_imsi)?;
        let header = TunnelHeader {
            message_type,
            teid: unit.teid,
        };
        let packet = match header.encapsulate(&unit.payload) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(self.logger, "Dropping {unit} - {e}");
                self.counters[DROP_TX_FAILED].inc();
                return Ok(());
            }
        };
        let remote = SocketAddr::new(peer.remote_ip, self.tunnel.user_plane_port());
        debug!(self.logger, "{message_type:?} {unit} >> {remote}");
        match self
            .provider
            .send_to(peer.user_plane_endpoint, remote, &packet)
        {
            Ok(()) => {
                self.counters[TX_DATA_DATAGRAMS].inc();
                self.counters[TX_DATA_BYTES].add(packet.len());
            }
            Err(e) => {
                warn!(self.logger, "Failed to send {unit} - {e}");
                self.counters[DROP_TX_FAILED].inc();
            }
        }
        Ok(())
    }

    pub fn send_reconfiguration(
        &mut self,
        target_imsi: Imsi,
        message: RrcReconfiguration,
    ) -> Result<(), DcxError> {
        info!(self.logger, "RrcDcConnectionReconfiguration >> IMSI {target_imsi}");
        self.send_control(
            target_imsi,
            DcxControlMessage::RrcDcConnectionReconfiguration(message),
        )
    }

    pub fn send_reconfiguration_completed(
        &mut self,
        target_imsi: Imsi,
        message: RrcReconfigurationCompleted,
    ) -> Result<(), DcxError> {
        info!(self.logger, "RrcDcConnectionReconfigurationCompleted >> IMSI {target_imsi}");
        self.send_control(
            target_imsi,
            DcxControlMessage::RrcDcConnectionReconfigurationCompleted(message),
        )
    }

    fn send_control(
        &mut self,
        target_imsi: Imsi,
        message: DcxControlMessage,
    ) -> Result<(), DcxError> {
        let peer = *self.endpoints.peer(target_imsi)?;
        let bytes = message.encode(self.framing)?;
        let remote = SocketAddr::new(peer.remote_ip, self.tunnel.control_port());
        self.provider
            .send_to(peer.control_endpoint, remote, &bytes)?;
        Ok(())
    }

    /// Process a datagram that arrived on one of our endpoints.  An endpoint we never bound
    /// is an error; a datagram we cannot make sense of is logged and dropped.
    pub fn on_datagram(
        &mut self,
        endpoint: EndpointId,
        bytes: &[u8],
    ) -> Result<Option<DcxEvent>, DcxError> {
        let binding = *self.endpoints.binding(endpoint)?;
        let source_imsi = binding.remote_imsi;
        let target_imsi = binding.local_imsi;

        match binding.plane {
            Plane::Control => {
                self.counters[RX_CONTROL_DATAGRAMS].inc();
                self.counters[RX_CONTROL_BYTES].add(bytes.len());
                match DcxControlMessage::decode(bytes, self.framing) {
                    Ok(DcxControlMessage::RrcDcConnectionReconfiguration(message)) => {
                        info!(self.logger, "RrcDcConnectionReconfiguration << IMSI {source_imsi}");
                        Ok(Some(DcxEvent::Reconfiguration {
                            source_imsi,
                            target_imsi,
                            message,
                        }))
                    }
                    Ok(DcxControlMessage::RrcDcConnectionReconfigurationCompleted(message)) => {
                        info!(
                            self.logger,
                            "RrcDcConnectionReconfigurationCompleted << IMSI {source_imsi}"
                        );
                        Ok(Some(DcxEvent::ReconfigurationCompleted {
                            source_imsi,
                            target_imsi,
                            message,
                        }))
                    }
                    Err(e) => {
                        warn!(
                            self.logger,
                            "Undecodable control datagram from IMSI {source_imsi} - {e}: {}",
                            hex::encode(bytes)
                        );
                        self.counters[DROP_UNDECODABLE_CONTROL].inc();
                        Ok(None)
                    }
                }
            }
            Plane::UserPlane => {
                self.counters[RX_DATA_DATAGRAMS].inc();
                self.counters[RX_DATA_BYTES].add(bytes.len());
                let (header, payload) = match TunnelHeader::decapsulate(bytes) {
                    Ok(x) => x,
                    Err(e) => {
                        warn!(self.logger, "Undecodable data from IMSI {source_imsi} - {e}");
                        self.counters[DROP_UNDECODABLE_DATA].inc();
                        return Ok(None);
                    }
                };
                let unit = UeDataUnit {
                    source_imsi,
                    target_imsi,
                    teid: header.teid,
                    payload: payload.to_vec(),
                    tag: None,
                };
                Ok(self.receive_from_tunnel(header.message_type, unit))
            }
        }
    }

    /// Route a unit that arrived through the tunnel.
    pub fn receive_from_tunnel(
        &mut self,
        message_type: TunnelMessageType,
        mut unit: UeDataUnit,
    ) -> Option<DcxEvent> {
        debug!(self.logger, "{message_type:?} {unit} <<");
        if self.routes.is_suppressed(unit.teid) {
            // Arrived during a secondary cell handover.
            debug!(self.logger, "Dropping {unit} - TEID is suppressed");
            self.counters[DROP_SUPPRESSED].inc();
            return None;
        }

        match message_type {
            TunnelMessageType::ForwardDownlinkData => match self.routes.rlc_user(unit.teid) {
                Some(lcid) => {
                    unit.tag = Some(PdcpTag::now());
                    Some(DcxEvent::ToRlc { lcid, unit })
                }
                None => {
                    info!(self.logger, "Not implemented: forward {unit} to the other UE");
                    self.counters[DROP_NO_CONSUMER].inc();
                    None
                }
            },
            TunnelMessageType::ForwardUplinkData => match self.routes.pdcp_user(unit.teid) {
                Some(lcid) => Some(DcxEvent::ToPdcp { lcid, unit }),
                None => {
                    warn!(self.logger, "No PDCP user for {unit}");
                    self.counters[DROP_NO_CONSUMER].inc();
                    None
                }
            },
            TunnelMessageType::GPdu => Some(DcxEvent::UeData(unit)),
        }
    }
}

impl<E: EndpointProvider> Drop for UeDcx<E> {
    fn drop(&mut self) {
        let endpoints: Vec<EndpointId> = self.endpoints.endpoints().collect();
        for endpoint in endpoints {
            self.provider.close_endpoint(endpoint);
        }
    }
}
