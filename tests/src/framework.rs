use super::{MockEndpoints, MockNetwork, MockStack, MockUpperLayer};
use anyhow::Result;
use dcnode::{
    BearerConfig, Config, Datagram, Imsi, Lcid, PeerConfig, RelayConfig, SplitPolicy, UeNode,
};
use dcx::{ControlFraming, Teid};
use slog::{Drain, Logger, o};

pub const MASTER_IMSI: Imsi = 1001;
pub const SECONDARY_IMSI: Imsi = 1002;
pub const MASTER_IP: &str = "127.0.0.1";
pub const SECONDARY_IP: &str = "127.0.0.2";

// The split bearer is on LCID 4 of the master.  The secondary carries it on its own LCID 5.
pub const BEARER_LCID: Lcid = 4;
pub const RELAY_LCID: Lcid = 5;
pub const DC_TEID: Teid = Teid(0x0700_0001);

const MASTER: usize = 0;
const SECONDARY: usize = 1;

pub type TestNode = UeNode<MockEndpoints, MockStack, MockUpperLayer>;

pub struct TwoNodes {
    pub network: MockNetwork,
    pub master: TestNode,
    pub secondary: TestNode,
    pub logger: Logger,
}

/// Options that vary between test scripts.
pub struct Setup {
    pub control_framing: ControlFraming,
    pub use_dual_connectivity: bool,
    pub use_in_sequence_delivery: bool,
    pub split_policy: SplitPolicy,
}

impl Default for Setup {
    fn default() -> Self {
        Setup {
            control_framing: ControlFraming::Tagged,
            use_dual_connectivity: true,
            use_in_sequence_delivery: true,
            split_policy: SplitPolicy::Alternate,
        }
    }
}

pub fn init() -> Result<TwoNodes> {
    init_with(Setup::default())
}

pub fn init_with(setup: Setup) -> Result<TwoNodes> {
    let logger = init_logging();
    let network = MockNetwork::new(&logger);

    let mut master_config = config(&setup, MASTER_IMSI, MASTER_IP, SECONDARY_IMSI, SECONDARY_IP)?;
    master_config.bearers.push(BearerConfig {
        lcid: BEARER_LCID,
        peer_imsi: Some(SECONDARY_IMSI),
        teid: Some(DC_TEID),
    });
    let mut secondary_config =
        config(&setup, SECONDARY_IMSI, SECONDARY_IP, MASTER_IMSI, MASTER_IP)?;
    secondary_config.relays.push(RelayConfig {
        lcid: RELAY_LCID,
        master_imsi: MASTER_IMSI,
        teid: DC_TEID,
    });

    let master = UeNode::from_config(
        &master_config,
        network.endpoints(MASTER),
        MockStack::default(),
        MockUpperLayer::default(),
        &logger,
    )?;
    let secondary = UeNode::from_config(
        &secondary_config,
        network.endpoints(SECONDARY),
        MockStack::default(),
        MockUpperLayer::default(),
        &logger,
    )?;

    Ok(TwoNodes {
        network,
        master,
        secondary,
        logger,
    })
}

fn config(
    setup: &Setup,
    imsi: Imsi,
    ip: &str,
    peer_imsi: Imsi,
    peer_ip: &str,
) -> Result<Config> {
    let mut config = Config::new(imsi, ip.parse()?);
    config.use_dual_connectivity = setup.use_dual_connectivity;
    config.use_in_sequence_delivery = setup.use_in_sequence_delivery;
    config.split_policy = setup.split_policy;
    config.control_framing = setup.control_framing;
    config.peers.push(PeerConfig {
        imsi: peer_imsi,
        ip: peer_ip.parse()?,
        local_ip: None,
    });
    config.validate()?;
    Ok(config)
}

impl TwoNodes {
    /// Deliver datagrams until the network is idle, returning how many were delivered.
    pub fn deliver_all(&mut self) -> Result<usize> {
        let mut delivered = 0;
        loop {
            let in_flight = self.network.take_in_flight();
            if in_flight.is_empty() {
                return Ok(delivered);
            }
            for (node, datagram) in in_flight {
                self.deliver(node, datagram)?;
                delivered += 1;
            }
        }
    }

    pub fn deliver(&mut self, node: usize, datagram: Datagram) -> Result<()> {
        let node = if node == MASTER {
            &mut self.master
        } else {
            &mut self.secondary
        };
        node.on_datagram(datagram.endpoint, &datagram.bytes)?;
        Ok(())
    }

    /// Play the role of the radio link and network beyond the secondary: the PDUs that the
    /// secondary relayed come straight back in on its relay LCID, and go back to the master.
    pub fn loop_back_relayed_pdus(&mut self) -> Result<usize> {
        let relayed = self.secondary.stack_mut().take();
        let count = relayed.len();
        for (lcid, pdu, _tag) in relayed {
            self.secondary.on_local_stack_pdu(lcid, pdu, None)?;
        }
        Ok(count)
    }
}

pub fn init_logging() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build();
    let drain = std::sync::Mutex::new(drain).fuse();
    let drain = slog_envlogger::new(drain);
    slog::Logger::root(drain, o!())
}

/// An SDU big enough to pass the short SDU check, identifiable by its first byte.
pub fn test_sdu(id: u8) -> Vec<u8> {
    let mut sdu = vec![0u8; 100];
    sdu[0] = id;
    sdu
}
