use crate::{DcxError, EndpointProvider, Imsi, Lcid, LocalStack, UeDataUnit, UeDcx};
use dcx::Teid;
use pdcp::{PdcpPdu, PdcpTag};
use slog::{Logger, debug, o};

/// The RLC end of another UE's split bearer.  PDCP PDUs forwarded by the master UE are sent
/// on this UE's radio link, and PDUs received on it are forwarded back to the master.
pub struct DcRelay {
    lcid: Lcid,
    local_imsi: Imsi,
    master_imsi: Imsi,
    teid: Teid,
    logger: Logger,
}

impl DcRelay {
    pub fn new(
        lcid: Lcid,
        local_imsi: Imsi,
        master_imsi: Imsi,
        teid: Teid,
        logger: &Logger,
    ) -> Self {
        DcRelay {
            lcid,
            local_imsi,
            master_imsi,
            teid,
            logger: logger.new(o!("relay" => lcid, "teid" => teid.0)),
        }
    }

    pub fn lcid(&self) -> Lcid {
        self.lcid
    }

    pub fn teid(&self) -> Teid {
        self.teid
    }

    pub fn master_imsi(&self) -> Imsi {
        self.master_imsi
    }

    pub fn transmit_forwarded(&self, unit: UeDataUnit, stack: &mut impl LocalStack) {
        debug!(self.logger, "Forwarded downlink {unit} >> local stack");
        let tag = unit.tag.unwrap_or_else(PdcpTag::now);
        stack.transmit_pdcp_pdu(self.lcid, PdcpPdu(unit.payload), tag);
    }

    pub fn receive_from_local_stack<E: EndpointProvider>(
        &self,
        pdu: PdcpPdu,
        dcx: &mut UeDcx<E>,
    ) -> Result<(), DcxError> {
        let unit = UeDataUnit {
            source_imsi: self.local_imsi,
            target_imsi: self.master_imsi,
            teid: self.teid,
            payload: pdu.into(),
            tag: None,
        };
        debug!(self.logger, "Uplink {unit} >> master");
        dcx.send_forward_uplink(unit)
    }
}
