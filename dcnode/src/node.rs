//! node - a UE with dual connectivity split bearers, owning its end of the DCX tunnel

use crate::{
    BearerCounters, BearerPhase, BearerSettings, Config, DcBearer, DcRelay, DcxCounters,
    DcxError, DcxEvent, EndpointId, EndpointProvider, Imsi, Lcid, LocalStack, Path,
    TunnelParams, UeDataUnit, UeDcx, UpperLayer,
};
use dcx::{ControlFraming, RrcReconfiguration, RrcReconfigurationCompleted, Teid, TunnelKind};
use pdcp::{PdcpPdu, PdcpStatus, PdcpTag};
use slog::{Logger, debug, info, o, warn};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;

pub struct UeNode<E: EndpointProvider, S: LocalStack, U: UpperLayer> {
    imsi: Imsi,
    dcx: UeDcx<E>,
    bearers: BTreeMap<Lcid, DcBearer>,
    relays: BTreeMap<Lcid, DcRelay>,
    settings: BearerSettings,
    stack: S,
    upper: U,
    logger: Logger,
}

impl<E: EndpointProvider, S: LocalStack, U: UpperLayer> UeNode<E, S, U> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        imsi: Imsi,
        provider: E,
        tunnel: TunnelKind,
        framing: ControlFraming,
        settings: BearerSettings,
        stack: S,
        upper: U,
        logger: &Logger,
    ) -> Self {
        let logger = logger.new(o!("imsi" => imsi));
        UeNode {
            imsi,
            dcx: UeDcx::new(imsi, provider, tunnel, framing, &logger),
            bearers: BTreeMap::new(),
            relays: BTreeMap::new(),
            settings,
            stack,
            upper,
            logger,
        }
    }

    /// Build a node and set up its interfaces, bearers and relays.
    pub fn from_config(
        config: &Config,
        provider: E,
        stack: S,
        upper: U,
        logger: &Logger,
    ) -> Result<Self, DcxError> {
        let settings = BearerSettings {
            use_dual_connectivity: config.use_dual_connectivity,
            use_in_sequence_delivery: config.use_in_sequence_delivery,
            split_policy: config.split_policy,
        };
        let mut node = UeNode::new(
            config.imsi,
            provider,
            config.tunnel,
            config.control_framing,
            settings,
            stack,
            upper,
            logger,
        );
        for peer in &config.peers {
            node.add_interface(peer.local_ip.unwrap_or(config.local_ip), peer.imsi, peer.ip)?;
        }
        for bearer in &config.bearers {
            node.add_bearer(bearer.lcid)?;
            if let (Some(peer_imsi), Some(teid)) = (bearer.peer_imsi, bearer.teid) {
                node.attach_bearer(bearer.lcid, peer_imsi, teid)?;
            }
        }
        for relay in &config.relays {
            node.add_relay(relay.lcid, relay.master_imsi, relay.teid)?;
        }
        Ok(node)
    }

    pub fn imsi(&self) -> Imsi {
        self.imsi
    }

    pub fn dcx(&self) -> &UeDcx<E> {
        &self.dcx
    }

    pub fn dcx_counters(&self) -> Arc<DcxCounters> {
        self.dcx.counters()
    }

    pub fn bearer(&self, lcid: Lcid) -> Option<&DcBearer> {
        self.bearers.get(&lcid)
    }

    pub fn bearer_counters(&self) -> Vec<(Lcid, Arc<BearerCounters>)> {
        self.bearers
            .iter()
            .map(|(lcid, bearer)| (*lcid, bearer.counters()))
            .collect()
    }

    pub fn relay(&self, lcid: Lcid) -> Option<&DcRelay> {
        self.relays.get(&lcid)
    }

    pub fn stack(&self) -> &S {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut S {
        &mut self.stack
    }

    pub fn upper(&self) -> &U {
        &self.upper
    }

    pub fn upper_mut(&mut self) -> &mut U {
        &mut self.upper
    }

    pub fn add_interface(
        &mut self,
        local_ip: IpAddr,
        remote_imsi: Imsi,
        remote_ip: IpAddr,
    ) -> Result<(), DcxError> {
        self.dcx.add_interface(local_ip, remote_imsi, remote_ip)
    }

    /// Add a bearer carried on the local radio link.  A released bearer on the same LCID is
    /// replaced.
    pub fn add_bearer(&mut self, lcid: Lcid) -> Result<(), DcxError> {
        let in_use = self.relays.contains_key(&lcid)
            || self
                .bearers
                .get(&lcid)
                .is_some_and(|b| b.phase() != BearerPhase::TornDown);
        if in_use {
            return Err(DcxError::DuplicateLcid(lcid));
        }
        self.bearers
            .insert(lcid, DcBearer::new(lcid, self.settings, &self.logger));
        info!(self.logger, "Added bearer on LCID {lcid}");
        Ok(())
    }

    /// Split the bearer on `lcid` with the peer UE `peer_imsi`, tunnelled on `teid`.
    pub fn attach_bearer(
        &mut self,
        lcid: Lcid,
        peer_imsi: Imsi,
        teid: Teid,
    ) -> Result<(), DcxError> {
        if !self.dcx.endpoint_table().contains_peer(peer_imsi) {
            return Err(DcxError::UnknownPeer(peer_imsi));
        }
        let bearer = self
            .bearers
            .get_mut(&lcid)
            .ok_or(DcxError::UnknownBearer(lcid))?;
        let previous = bearer.tunnel().map(|t| t.teid);
        bearer.attach(TunnelParams {
            source_imsi: self.imsi,
            target_imsi: peer_imsi,
            teid,
        })?;
        if let Some(previous) = previous {
            self.dcx.routes_mut().deregister_pdcp_user(previous);
        }
        self.dcx.routes_mut().register_pdcp_user(teid, lcid);
        Ok(())
    }

    pub fn remove_bearer(&mut self, lcid: Lcid) -> Result<(), DcxError> {
        let bearer = self
            .bearers
            .get_mut(&lcid)
            .ok_or(DcxError::UnknownBearer(lcid))?;
        if let Some(tunnel) = bearer.release() {
            self.dcx.routes_mut().deregister_pdcp_user(tunnel.teid);
        }
        Ok(())
    }

    pub fn add_relay(&mut self, lcid: Lcid, master_imsi: Imsi, teid: Teid) -> Result<(), DcxError> {
        if self.bearers.contains_key(&lcid) || self.relays.contains_key(&lcid) {
            return Err(DcxError::DuplicateLcid(lcid));
        }
        if !self.dcx.endpoint_table().contains_peer(master_imsi) {
            return Err(DcxError::UnknownPeer(master_imsi));
        }
        self.relays.insert(
            lcid,
            DcRelay::new(lcid, self.imsi, master_imsi, teid, &self.logger),
        );
        self.dcx.routes_mut().register_rlc_user(teid, lcid);
        info!(
            self.logger,
            "Relaying LCID {lcid} for IMSI {master_imsi} on TEID {teid}"
        );
        Ok(())
    }

    pub fn remove_relay(&mut self, lcid: Lcid) -> Result<(), DcxError> {
        let relay = self
            .relays
            .remove(&lcid)
            .ok_or(DcxError::UnknownBearer(lcid))?;
        self.dcx.routes_mut().deregister_rlc_user(relay.teid());
        info!(self.logger, "Removed relay on LCID {lcid}");
        Ok(())
    }

    /// Send an SDU on the bearer on `lcid`.
    pub fn transmit(&mut self, lcid: Lcid, sdu: &[u8]) -> Result<Path, DcxError> {
        let bearer = self
            .bearers
            .get_mut(&lcid)
            .ok_or(DcxError::UnknownBearer(lcid))?;
        bearer.transmit(sdu, &mut self.stack, &mut self.dcx)
    }

    pub fn pdcp_status(&self, lcid: Lcid) -> Result<PdcpStatus, DcxError> {
        self.bearers
            .get(&lcid)
            .map(DcBearer::status)
            .ok_or(DcxError::UnknownBearer(lcid))
    }

    pub fn set_pdcp_status(&mut self, lcid: Lcid, status: PdcpStatus) -> Result<(), DcxError> {
        self.bearers
            .get_mut(&lcid)
            .ok_or(DcxError::UnknownBearer(lcid))?
            .set_status(status);
        Ok(())
    }

    pub fn send_ue_data(
        &mut self,
        target_imsi: Imsi,
        teid: Teid,
        payload: Vec<u8>,
    ) -> Result<(), DcxError> {
        self.dcx.send_ue_data(UeDataUnit {
            source_imsi: self.imsi,
            target_imsi,
            teid,
            payload,
            tag: None,
        })
    }

    pub fn send_reconfiguration(
        &mut self,
        target_imsi: Imsi,
        message: RrcReconfiguration,
    ) -> Result<(), DcxError> {
        self.dcx.send_reconfiguration(target_imsi, message)
    }

    pub fn send_reconfiguration_completed(
        &mut self,
        target_imsi: Imsi,
        message: RrcReconfigurationCompleted,
    ) -> Result<(), DcxError> {
        self.dcx.send_reconfiguration_completed(target_imsi, message)
    }

    pub fn add_teid_to_be_forwarded(
        &mut self,
        teid: Teid,
        target_imsi: Imsi,
    ) -> Result<(), DcxError> {
        self.dcx.add_teid_to_be_forwarded(teid, target_imsi)
    }

    pub fn remove_teid_to_be_forwarded(&mut self, teid: Teid) -> Result<(), DcxError> {
        self.dcx.remove_teid_to_be_forwarded(teid)
    }

    /// Handle a datagram that arrived on one of the node's endpoints.
    pub fn on_datagram(&mut self, endpoint: EndpointId, bytes: &[u8]) -> Result<(), DcxError> {
        let Some(event) = self.dcx.on_datagram(endpoint, bytes)? else {
            return Ok(());
        };
        match event {
            DcxEvent::Reconfiguration {
                source_imsi,
                target_imsi,
                message,
            } => self
                .upper
                .recv_reconfiguration(source_imsi, target_imsi, message),
            DcxEvent::ReconfigurationCompleted {
                source_imsi,
                target_imsi,
                message,
            } => self
                .upper
                .recv_reconfiguration_completed(source_imsi, target_imsi, message),
            DcxEvent::ToRlc { lcid, unit } => match self.relays.get(&lcid) {
                Some(relay) => relay.transmit_forwarded(unit, &mut self.stack),
                None => warn!(self.logger, "No relay on LCID {lcid} for {unit}"),
            },
            DcxEvent::ToPdcp { lcid, unit } => match self.bearers.get_mut(&lcid) {
                Some(bearer) => bearer.receive_dc_pdcp_pdu(unit, &mut self.upper),
                None => warn!(self.logger, "No bearer on LCID {lcid} for {unit}"),
            },
            DcxEvent::UeData(unit) => self.upper.recv_ue_data(unit),
        }
        Ok(())
    }

    /// Handle a PDU received on the local radio link.
    pub fn on_local_stack_pdu(
        &mut self,
        lcid: Lcid,
        pdu: PdcpPdu,
        tag: Option<PdcpTag>,
    ) -> Result<(), DcxError> {
        if let Some(bearer) = self.bearers.get_mut(&lcid) {
            bearer.receive_from_local_stack(pdu, tag, &mut self.upper);
        } else if let Some(relay) = self.relays.get(&lcid) {
            relay.receive_from_local_stack(pdu, &mut self.dcx)?;
        } else {
            debug!(self.logger, "Dropping PDU on unknown LCID {lcid}");
        }
        Ok(())
    }
}
