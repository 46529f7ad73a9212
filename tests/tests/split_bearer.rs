use anyhow::Result;
use atomic_counter::AtomicCounter;
use dcnode::{DcxError, dcx_counter_indices::DROP_NO_CONSUMER};
use dcnode_tests::framework::*;
use dcx::Teid;

#[test]
fn uplink_alternates_between_local_and_peer() -> Result<()> {
    let mut nodes = init()?;
    for id in 0..4 {
        nodes.master.transmit(BEARER_LCID, &test_sdu(id))?;
    }

    // Even sequence numbers on the local radio link, odd ones through the peer.
    assert_eq!(nodes.master.stack().seq_nums(), [0, 2]);
    assert_eq!(nodes.deliver_all()?, 2);
    let relayed = &nodes.secondary.stack().transmitted;
    assert!(relayed.iter().all(|(lcid, _, _)| *lcid == RELAY_LCID));
    assert_eq!(nodes.secondary.stack().seq_nums(), [1, 3]);
    Ok(())
}

#[test]
fn pdus_from_both_paths_are_delivered_in_order() -> Result<()> {
    let mut nodes = init()?;
    for id in 0..4 {
        nodes.master.transmit(BEARER_LCID, &test_sdu(id))?;
    }
    nodes.deliver_all()?;

    // The peer path is quicker, so SNs 1 and 3 arrive first and are held back.
    assert_eq!(nodes.loop_back_relayed_pdus()?, 2);
    assert_eq!(nodes.deliver_all()?, 2);
    assert!(nodes.master.upper().sdus.is_empty());
    assert!(nodes.master.bearer(BEARER_LCID).unwrap().has_gap());

    for (lcid, pdu, tag) in nodes.master.stack_mut().take() {
        nodes.master.on_local_stack_pdu(lcid, pdu, Some(tag))?;
    }
    let ids: Vec<u8> = nodes.master.upper().sdus.iter().map(|(_, sdu)| sdu[0]).collect();
    assert_eq!(ids, [0, 1, 2, 3]);
    assert!(!nodes.master.bearer(BEARER_LCID).unwrap().has_gap());
    assert_eq!(nodes.master.pdcp_status(BEARER_LCID)?.rx_sn, 4);
    Ok(())
}

#[test]
fn without_in_sequence_delivery_pdus_are_delivered_on_arrival() -> Result<()> {
    let mut nodes = init_with(Setup {
        use_in_sequence_delivery: false,
        ..Setup::default()
    })?;
    for id in 0..4 {
        nodes.master.transmit(BEARER_LCID, &test_sdu(id))?;
    }
    nodes.deliver_all()?;
    nodes.loop_back_relayed_pdus()?;
    nodes.deliver_all()?;
    for (lcid, pdu, tag) in nodes.master.stack_mut().take() {
        nodes.master.on_local_stack_pdu(lcid, pdu, Some(tag))?;
    }
    let ids: Vec<u8> = nodes.master.upper().sdus.iter().map(|(_, sdu)| sdu[0]).collect();
    assert_eq!(ids, [1, 3, 0, 2]);
    Ok(())
}

#[test]
fn dual_connectivity_disabled_keeps_everything_local() -> Result<()> {
    let mut nodes = init_with(Setup {
        use_dual_connectivity: false,
        ..Setup::default()
    })?;
    for id in 0..3 {
        nodes.master.transmit(BEARER_LCID, &test_sdu(id))?;
    }
    assert_eq!(nodes.master.stack().seq_nums(), [0, 1, 2]);
    assert_eq!(nodes.network.in_flight(), 0);
    let bearer = nodes.master.bearer(BEARER_LCID).unwrap();
    assert!(!bearer.path_selector().alternate_turn());
    Ok(())
}

#[test]
fn released_bearer_stops_routing() -> Result<()> {
    let mut nodes = init()?;
    nodes.master.transmit(BEARER_LCID, &test_sdu(0))?;
    nodes.master.transmit(BEARER_LCID, &test_sdu(1))?;
    nodes.deliver_all()?;

    nodes.master.remove_bearer(BEARER_LCID)?;
    assert!(matches!(
        nodes.master.transmit(BEARER_LCID, &test_sdu(2)),
        Err(DcxError::BearerReleased(BEARER_LCID))
    ));

    // The PDU the secondary still had is forwarded back but nobody owns the TEID any more.
    nodes.loop_back_relayed_pdus()?;
    nodes.deliver_all()?;
    assert!(nodes.master.upper().sdus.is_empty());
    assert_eq!(nodes.master.dcx_counters()[DROP_NO_CONSUMER].get(), 1);
    Ok(())
}

#[test]
fn ue_data_reaches_upper_layer() -> Result<()> {
    let mut nodes = init()?;
    nodes
        .master
        .send_ue_data(SECONDARY_IMSI, Teid(99), b"hello".to_vec())?;
    nodes.deliver_all()?;

    let unit = &nodes.secondary.upper().ue_data[0];
    assert_eq!(unit.source_imsi, MASTER_IMSI);
    assert_eq!(unit.target_imsi, SECONDARY_IMSI);
    assert_eq!(unit.teid, Teid(99));
    assert_eq!(unit.payload, b"hello");
    Ok(())
}
