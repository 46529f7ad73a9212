use crate::{DcxError, Imsi, Lcid};
use dcx::Teid;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Routes arriving tunnel PDUs by TEID.  A TEID maps to the LCID of the PDCP-side bearer (on the
/// UE that owns the split bearer) or of the RLC-side relay (on the UE that carries it).
#[derive(Debug, Default)]
pub struct TeidRoutingTable {
    pdcp_users: HashMap<Teid, Lcid>,
    rlc_users: HashMap<Teid, Lcid>,

    // TEIDs whose forwarded downlink is not delivered during handover, with the target IMSI.
    forwarding_suppressed: HashMap<Teid, Imsi>,
}

impl TeidRoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_pdcp_user(&mut self, teid: Teid, lcid: Lcid) {
        self.pdcp_users.insert(teid, lcid);
    }

    pub fn register_rlc_user(&mut self, teid: Teid, lcid: Lcid) {
        self.rlc_users.insert(teid, lcid);
    }

    pub fn deregister_pdcp_user(&mut self, teid: Teid) -> Option<Lcid> {
        self.pdcp_users.remove(&teid)
    }

    pub fn deregister_rlc_user(&mut self, teid: Teid) -> Option<Lcid> {
        self.rlc_users.remove(&teid)
    }

    pub fn pdcp_user(&self, teid: Teid) -> Option<Lcid> {
        self.pdcp_users.get(&teid).copied()
    }

    pub fn rlc_user(&self, teid: Teid) -> Option<Lcid> {
        self.rlc_users.get(&teid).copied()
    }

    pub fn add_suppression(&mut self, teid: Teid, target_imsi: Imsi) -> Result<(), DcxError> {
        match self.forwarding_suppressed.entry(teid) {
            Entry::Occupied(_) => Err(DcxError::TeidAlreadySuppressed(teid)),
            Entry::Vacant(v) => {
                v.insert(target_imsi);
                Ok(())
            }
        }
    }

    pub fn remove_suppression(&mut self, teid: Teid) -> Result<Imsi, DcxError> {
        self.forwarding_suppressed
            .remove(&teid)
            .ok_or(DcxError::TeidNotSuppressed(teid))
    }

    pub fn is_suppressed(&self, teid: Teid) -> bool {
        self.forwarding_suppressed.contains_key(&teid)
    }
}
