use anyhow::Result;
use dcnode::DcxError;
use dcnode_tests::framework::*;
use dcx::{ControlFraming, EncodeError, RrcReconfiguration, RrcReconfigurationCompleted};

fn exchange(framing: ControlFraming) -> Result<()> {
    let mut nodes = init_with(Setup {
        control_framing: framing,
        ..Setup::default()
    })?;

    nodes
        .master
        .send_reconfiguration(SECONDARY_IMSI, RrcReconfiguration(vec![0x08, 0x10, 0x22]))?;
    assert_eq!(nodes.deliver_all()?, 1);
    assert_eq!(
        nodes.secondary.upper().reconfigurations,
        [(
            MASTER_IMSI,
            SECONDARY_IMSI,
            RrcReconfiguration(vec![0x08, 0x10, 0x22])
        )]
    );

    let completed = RrcReconfigurationCompleted {
        rrc_transaction_identifier: 2,
    };
    nodes
        .secondary
        .send_reconfiguration_completed(MASTER_IMSI, completed)?;
    assert_eq!(nodes.deliver_all()?, 1);
    assert_eq!(
        nodes.master.upper().completions,
        [(SECONDARY_IMSI, MASTER_IMSI, completed)]
    );
    assert!(nodes.master.upper().reconfigurations.is_empty());
    Ok(())
}

#[test]
fn reconfiguration_exchange_tagged() -> Result<()> {
    exchange(ControlFraming::Tagged)
}

#[test]
fn reconfiguration_exchange_legacy() -> Result<()> {
    exchange(ControlFraming::Legacy)
}

#[test]
fn tagged_framing_carries_one_byte_reconfiguration() -> Result<()> {
    let mut nodes = init()?;
    nodes
        .master
        .send_reconfiguration(SECONDARY_IMSI, RrcReconfiguration(vec![0x55]))?;
    nodes.deliver_all()?;
    assert_eq!(
        nodes.secondary.upper().reconfigurations[0].2,
        RrcReconfiguration(vec![0x55])
    );
    assert!(nodes.secondary.upper().completions.is_empty());
    Ok(())
}

#[test]
fn legacy_framing_rejects_ambiguous_reconfiguration() -> Result<()> {
    let mut nodes = init_with(Setup {
        control_framing: ControlFraming::Legacy,
        ..Setup::default()
    })?;
    let result = nodes
        .master
        .send_reconfiguration(SECONDARY_IMSI, RrcReconfiguration(vec![0x55]));
    assert!(matches!(
        result,
        Err(DcxError::Encode(EncodeError::AmbiguousLegacyFraming(1)))
    ));
    assert_eq!(nodes.network.in_flight(), 0);
    Ok(())
}

#[test]
fn configuration_errors_are_reported() -> Result<()> {
    let mut nodes = init()?;
    assert!(matches!(
        nodes
            .master
            .send_reconfiguration(9999, RrcReconfiguration(vec![1, 2])),
        Err(DcxError::UnknownPeer(9999))
    ));
    assert!(matches!(
        nodes.master.add_interface(
            "127.0.0.9".parse()?,
            SECONDARY_IMSI,
            SECONDARY_IP.parse()?
        ),
        Err(DcxError::DuplicatePeer(SECONDARY_IMSI))
    ));
    // Two endpoints for each node, none leaked by the failed add.
    assert_eq!(nodes.network.bound_endpoints(), 4);
    Ok(())
}
