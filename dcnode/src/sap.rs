//! sap - service access points that the DC node uses to talk to the layers around it

use crate::{Imsi, Lcid, UeDataUnit};
use dcx::{RrcReconfiguration, RrcReconfigurationCompleted};
use pdcp::{PdcpPdu, PdcpTag};

/// The lower layers (RLC and MAC) of this UE's own radio stack.
pub trait LocalStack {
    fn transmit_pdcp_pdu(&mut self, lcid: Lcid, pdu: PdcpPdu, tag: PdcpTag);
}

/// The consumer of data and signaling coming out of the DC node.
pub trait UpperLayer {
    /// An SDU delivered by the PDCP of the split bearer on `lcid`.
    fn receive_pdcp_sdu(&mut self, lcid: Lcid, sdu: Vec<u8>);

    /// Plain UE data received from a peer UE.
    fn recv_ue_data(&mut self, unit: UeDataUnit);

    fn recv_reconfiguration(
        &mut self,
        source_imsi: Imsi,
        target_imsi: Imsi,
        message: RrcReconfiguration,
    );

    fn recv_reconfiguration_completed(
        &mut self,
        source_imsi: Imsi,
        target_imsi: Imsi,
        message: RrcReconfigurationCompleted,
    );
}
