use dcnode::{Imsi, Lcid, UeDataUnit, UpperLayer};
use dcx::{RrcReconfiguration, RrcReconfigurationCompleted};

#[derive(Default)]
pub struct MockUpperLayer {
    pub sdus: Vec<(Lcid, Vec<u8>)>,
    pub ue_data: Vec<UeDataUnit>,
    pub reconfigurations: Vec<(Imsi, Imsi, RrcReconfiguration)>,
    pub completions: Vec<(Imsi, Imsi, RrcReconfigurationCompleted)>,
}

impl UpperLayer for MockUpperLayer {
    fn receive_pdcp_sdu(&mut self, lcid: Lcid, sdu: Vec<u8>) {
        self.sdus.push((lcid, sdu));
    }

    fn recv_ue_data(&mut self, unit: UeDataUnit) {
        self.ue_data.push(unit);
    }

    fn recv_reconfiguration(
        &mut self,
        source_imsi: Imsi,
        target_imsi: Imsi,
        message: RrcReconfiguration,
    ) {
        self.reconfigurations
            .push((source_imsi, target_imsi, message));
    }

    fn recv_reconfiguration_completed(
        &mut self,
        source_imsi: Imsi,
        target_imsi: Imsi,
        message: RrcReconfigurationCompleted,
    ) {
        self.completions.push((source_imsi, target_imsi, message));
    }
}
