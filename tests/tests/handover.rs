use anyhow::Result;
use atomic_counter::AtomicCounter;
use dcnode::{DcxError, dcx_counter_indices::DROP_SUPPRESSED};
use dcnode_tests::framework::*;
use dcx::Teid;

const TARGET_IMSI: u64 = 1003;

#[test]
fn forwarding_is_suppressed_during_handover() -> Result<()> {
    let mut nodes = init()?;
    nodes
        .secondary
        .add_teid_to_be_forwarded(DC_TEID, TARGET_IMSI)?;
    assert!(matches!(
        nodes
            .secondary
            .add_teid_to_be_forwarded(DC_TEID, TARGET_IMSI),
        Err(DcxError::TeidAlreadySuppressed(DC_TEID))
    ));

    for id in 0..4 {
        nodes.master.transmit(BEARER_LCID, &test_sdu(id))?;
    }
    assert_eq!(nodes.deliver_all()?, 2);
    assert!(nodes.secondary.stack().transmitted.is_empty());
    assert_eq!(nodes.secondary.dcx_counters()[DROP_SUPPRESSED].get(), 2);

    nodes.secondary.remove_teid_to_be_forwarded(DC_TEID)?;
    assert!(matches!(
        nodes.secondary.remove_teid_to_be_forwarded(DC_TEID),
        Err(DcxError::TeidNotSuppressed(DC_TEID))
    ));

    nodes.master.transmit(BEARER_LCID, &test_sdu(4))?;
    nodes.master.transmit(BEARER_LCID, &test_sdu(5))?;
    nodes.deliver_all()?;
    assert_eq!(nodes.secondary.stack().seq_nums(), [5]);
    Ok(())
}

#[test]
fn suppression_covers_uplink_and_ue_data() -> Result<()> {
    let mut nodes = init_with(Setup {
        use_in_sequence_delivery: false,
        ..Setup::default()
    })?;
    nodes.master.transmit(BEARER_LCID, &test_sdu(0))?;
    nodes.master.transmit(BEARER_LCID, &test_sdu(1))?;
    nodes.deliver_all()?;

    nodes.master.add_teid_to_be_forwarded(DC_TEID, TARGET_IMSI)?;
    nodes.loop_back_relayed_pdus()?;
    nodes
        .secondary
        .send_ue_data(MASTER_IMSI, DC_TEID, b"during".to_vec())?;
    assert_eq!(nodes.deliver_all()?, 2);
    assert!(nodes.master.upper().sdus.is_empty());
    assert!(nodes.master.upper().ue_data.is_empty());
    assert_eq!(nodes.master.dcx_counters()[DROP_SUPPRESSED].get(), 2);

    // UE data on another TEID still gets through.
    nodes
        .secondary
        .send_ue_data(MASTER_IMSI, Teid(99), b"other".to_vec())?;
    nodes.deliver_all()?;
    assert_eq!(nodes.master.upper().ue_data.len(), 1);

    nodes.master.remove_teid_to_be_forwarded(DC_TEID)?;
    nodes.master.transmit(BEARER_LCID, &test_sdu(2))?;
    nodes.master.transmit(BEARER_LCID, &test_sdu(3))?;
    nodes.deliver_all()?;
    nodes.loop_back_relayed_pdus()?;
    nodes
        .secondary
        .send_ue_data(MASTER_IMSI, DC_TEID, b"after".to_vec())?;
    nodes.deliver_all()?;

    let ids: Vec<u8> = nodes.master.upper().sdus.iter().map(|(_, sdu)| sdu[0]).collect();
    assert_eq!(ids, [3]);
    assert_eq!(nodes.master.upper().ue_data.len(), 2);
    assert_eq!(nodes.master.upper().ue_data[1].payload, b"after");
    assert_eq!(nodes.master.dcx_counters()[DROP_SUPPRESSED].get(), 2);
    Ok(())
}

#[test]
fn pdcp_status_survives_bearer_replacement() -> Result<()> {
    let mut nodes = init()?;
    for id in 0..3 {
        nodes.master.transmit(BEARER_LCID, &test_sdu(id))?;
    }
    let status = nodes.master.pdcp_status(BEARER_LCID)?;
    assert_eq!(status.tx_sn, 3);

    nodes.master.remove_bearer(BEARER_LCID)?;
    nodes.master.add_bearer(BEARER_LCID)?;
    nodes.master.set_pdcp_status(BEARER_LCID, status)?;
    nodes
        .master
        .attach_bearer(BEARER_LCID, SECONDARY_IMSI, DC_TEID)?;

    nodes.master.stack_mut().take();
    nodes.master.transmit(BEARER_LCID, &test_sdu(3))?;
    assert_eq!(nodes.master.stack().seq_nums(), [3]);
    Ok(())
}

#[test]
fn lcid_cannot_be_reused_while_in_use() -> Result<()> {
    let mut nodes = init()?;
    assert!(matches!(
        nodes.master.add_bearer(BEARER_LCID),
        Err(DcxError::DuplicateLcid(BEARER_LCID))
    ));
    assert!(matches!(
        nodes.secondary.add_bearer(RELAY_LCID),
        Err(DcxError::DuplicateLcid(RELAY_LCID))
    ));
    nodes.secondary.remove_relay(RELAY_LCID)?;
    nodes.secondary.add_bearer(RELAY_LCID)?;
    Ok(())
}
