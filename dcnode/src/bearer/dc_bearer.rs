//! dc_bearer - the PDCP end of a split bearer, on the UE that owns it

use super::counters::{BearerCounters, bearer_counter_indices::*};
use super::{Path, PathSelector, SplitPolicy};
use crate::{
    DcxError, EndpointProvider, Imsi, Lcid, LocalStack, UeDataUnit, UeDcx, UpperLayer,
};
use atomic_counter::AtomicCounter;
use dcx::Teid;
use pdcp::{PdcpPdu, PdcpStatus, PdcpTag, SequenceEngine};
use slog::{Logger, debug, info, o, warn};
use std::sync::Arc;

/// SDUs no longer than IPv4 + UDP + sequence/timestamp headers are suspicious.
pub const MIN_SDU_LEN: usize = 20 + 8 + 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerPhase {
    /// Carried on the local radio link only.
    Idle,
    /// Split across the local link and the tunnel.
    Attached,
    TornDown,
}

/// Where remote-path PDUs of a bearer go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunnelParams {
    pub source_imsi: Imsi,
    pub target_imsi: Imsi,
    pub teid: Teid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BearerSettings {
    pub use_dual_connectivity: bool,
    pub use_in_sequence_delivery: bool,
    pub split_policy: SplitPolicy,
}

pub struct DcBearer {
    lcid: Lcid,
    phase: BearerPhase,
    tunnel: Option<TunnelParams>,
    engine: SequenceEngine<Vec<u8>>,
    selector: PathSelector,
    counters: Arc<BearerCounters>,
    logger: Logger,
}

impl DcBearer {
    pub fn new(lcid: Lcid, settings: BearerSettings, logger: &Logger) -> Self {
        DcBearer {
            lcid,
            phase: BearerPhase::Idle,
            tunnel: None,
            engine: SequenceEngine::new(settings.use_in_sequence_delivery),
            selector: PathSelector::new(settings.use_dual_connectivity, settings.split_policy),
            counters: Arc::new(BearerCounters::default()),
            logger: logger.new(o!("lcid" => lcid)),
        }
    }

    pub fn lcid(&self) -> Lcid {
        self.lcid
    }

    pub fn phase(&self) -> BearerPhase {
        self.phase
    }

    pub fn tunnel(&self) -> Option<&TunnelParams> {
        self.tunnel.as_ref()
    }

    pub fn counters(&self) -> Arc<BearerCounters> {
        self.counters.clone()
    }

    pub fn path_selector(&self) -> &PathSelector {
        &self.selector
    }

    pub fn has_gap(&self) -> bool {
        self.engine.has_gap()
    }

    pub fn buffered(&self) -> usize {
        self.engine.buffered()
    }

    pub fn status(&self) -> PdcpStatus {
        self.engine.status()
    }

    pub fn set_status(&mut self, status: PdcpStatus) {
        info!(
            self.logger,
            "PDCP status set to tx {} rx {}", status.tx_sn, status.rx_sn
        );
        self.engine.set_status(status);
    }

    /// Start splitting the bearer over the tunnel described by `params`.
    pub fn attach(&mut self, params: TunnelParams) -> Result<(), DcxError> {
        if self.phase == BearerPhase::TornDown {
            return Err(DcxError::BearerReleased(self.lcid));
        }
        info!(
            self.logger,
            "Attached to IMSI {} on TEID {}", params.target_imsi, params.teid
        );
        self.tunnel = Some(params);
        self.phase = BearerPhase::Attached;
        Ok(())
    }

    /// Tear down the bearer, returning the tunnel it used if any.
    pub fn release(&mut self) -> Option<TunnelParams> {
        if self.phase != BearerPhase::TornDown {
            info!(
                self.logger,
                "Released with {} PDUs in the reorder buffer",
                self.engine.buffered()
            );
        }
        self.phase = BearerPhase::TornDown;
        self.tunnel.take()
    }

    /// Number, frame and send an SDU on whichever path is selected.
    pub fn transmit<E: EndpointProvider>(
        &mut self,
        sdu: &[u8],
        stack: &mut impl LocalStack,
        dcx: &mut UeDcx<E>,
    ) -> Result<Path, DcxError> {
        if self.phase == BearerPhase::TornDown {
            return Err(DcxError::BearerReleased(self.lcid));
        }
        let sn = self.engine.assign_tx_sn();
        let pdu = PdcpPdu::new_data(sn, sdu);
        let tag = PdcpTag::now();
        self.counters[TX_PDUS].inc();

        let path = self.selector.select_path(self.tunnel.is_some());
        debug!(self.logger, "SN {sn} >> {path:?}");
        match path {
            Path::Local => {
                self.counters[TX_LOCAL].inc();
                stack.transmit_pdcp_pdu(self.lcid, pdu, tag);
            }
            Path::Remote => {
                let Some(tunnel) = self.tunnel else {
                    return Err(DcxError::NoTunnelProvider(self.lcid));
                };
                self.counters[TX_REMOTE].inc();
                dcx.send_forward_downlink(UeDataUnit {
                    source_imsi: tunnel.source_imsi,
                    target_imsi: tunnel.target_imsi,
                    teid: tunnel.teid,
                    payload: pdu.into(),
                    tag: Some(tag),
                })?;
            }
        }
        Ok(path)
    }

    /// A PDU received on the local radio link.
    pub fn receive_from_local_stack(
        &mut self,
        pdu: PdcpPdu,
        tag: Option<PdcpTag>,
        upper: &mut impl UpperLayer,
    ) {
        self.receive_pdu(pdu, tag, upper);
    }

    /// A PDU received by the peer UE and forwarded back through the tunnel.
    pub fn receive_dc_pdcp_pdu(&mut self, unit: UeDataUnit, upper: &mut impl UpperLayer) {
        debug!(self.logger, "Forwarded uplink {unit}");
        self.receive_pdu(PdcpPdu(unit.payload), unit.tag, upper);
    }

    fn receive_pdu(&mut self, pdu: PdcpPdu, tag: Option<PdcpTag>, upper: &mut impl UpperLayer) {
        if self.phase == BearerPhase::TornDown {
            debug!(self.logger, "Dropping PDU received after release");
            return;
        }
        self.counters[RX_PDUS].inc();
        if let Some(tag) = tag {
            let delay = tag.delay();
            self.counters[RX_DELAY_MICROS].add(delay.as_micros() as usize);
            debug!(self.logger, "PDU delay {delay:?}");
        }

        let (sn, sdu) = match pdu.into_sdu() {
            Ok(x) => x,
            Err(e) => {
                warn!(self.logger, "Dropping PDU - {e}");
                self.counters[DROP_BAD_PDU].inc();
                return;
            }
        };

        let forced_before = self.engine.forced_advances();
        let delivered = self.engine.on_receive(sn, sdu);
        let forced = self.engine.forced_advances() - forced_before;
        if forced > 0 {
            warn!(
                self.logger,
                "SN {sn} outside reordering window - forced {forced} advances, rx now {}",
                self.engine.rx_sn()
            );
            self.counters[FORCED_ADVANCES].add(forced as usize);
        }
        if delivered.is_empty() {
            debug!(self.logger, "SN {sn} buffered, waiting for {}", self.engine.rx_sn());
        }

        for sdu in delivered {
            if sdu.len() <= MIN_SDU_LEN {
                warn!(self.logger, "Delivering short SDU of {} bytes", sdu.len());
                self.counters[SHORT_SDUS].inc();
            }
            self.counters[DELIVERED_SDUS].inc();
            upper.receive_pdcp_sdu(self.lcid, sdu);
        }
    }
}
