//! mock_network - an in-memory datagram network.  Nothing is delivered until the test script
//! asks, so scripts control ordering and loss.

use anyhow::{Result, bail};
use dcnode::{Datagram, EndpointId, EndpointProvider};
use slog::{Logger, debug};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

pub type NodeIndex = usize;

#[derive(Default)]
struct Network {
    next_id: u32,
    bound: HashMap<SocketAddr, EndpointId>,
    owners: HashMap<EndpointId, (NodeIndex, SocketAddr)>,
    in_flight: VecDeque<(NodeIndex, Datagram)>,
    lost: usize,
}

#[derive(Clone)]
pub struct MockNetwork {
    network: Arc<Mutex<Network>>,
    logger: Logger,
}

impl MockNetwork {
    pub fn new(logger: &Logger) -> Self {
        MockNetwork {
            network: Arc::new(Mutex::new(Network::default())),
            logger: logger.clone(),
        }
    }

    /// An endpoint provider for the node with the given index.
    pub fn endpoints(&self, node: NodeIndex) -> MockEndpoints {
        MockEndpoints {
            node,
            network: self.network.clone(),
            logger: self.logger.clone(),
        }
    }

    /// Remove and return everything sent so far, oldest first.
    pub fn take_in_flight(&self) -> Vec<(NodeIndex, Datagram)> {
        self.network.lock().unwrap().in_flight.drain(..).collect()
    }

    pub fn in_flight(&self) -> usize {
        self.network.lock().unwrap().in_flight.len()
    }

    /// Datagrams sent to an address that nobody had bound.
    pub fn lost(&self) -> usize {
        self.network.lock().unwrap().lost
    }

    pub fn bound_endpoints(&self) -> usize {
        self.network.lock().unwrap().owners.len()
    }
}

pub struct MockEndpoints {
    node: NodeIndex,
    network: Arc<Mutex<Network>>,
    logger: Logger,
}

impl EndpointProvider for MockEndpoints {
    fn create_endpoint(&mut self, local_addr: SocketAddr) -> Result<EndpointId> {
        let mut network = self.network.lock().unwrap();
        if network.bound.contains_key(&local_addr) {
            bail!("Address {local_addr} already in use");
        }
        let id = EndpointId(network.next_id);
        network.next_id += 1;
        network.bound.insert(local_addr, id);
        network.owners.insert(id, (self.node, local_addr));
        Ok(id)
    }

    fn send_to(
        &mut self,
        endpoint: EndpointId,
        remote_addr: SocketAddr,
        bytes: &[u8],
    ) -> Result<()> {
        let mut network = self.network.lock().unwrap();
        if !network.owners.contains_key(&endpoint) {
            bail!("Send on unbound {endpoint}");
        }
        let destination = network.bound.get(&remote_addr).copied();
        let Some(destination) = destination else {
            debug!(self.logger, "Nobody listening on {remote_addr}");
            network.lost += 1;
            return Ok(());
        };
        let (node, _) = network.owners[&destination];
        network.in_flight.push_back((
            node,
            Datagram {
                endpoint: destination,
                bytes: bytes.to_vec(),
            },
        ));
        Ok(())
    }

    fn close_endpoint(&mut self, endpoint: EndpointId) {
        let mut network = self.network.lock().unwrap();
        if let Some((_, addr)) = network.owners.remove(&endpoint) {
            network.bound.remove(&addr);
        }
    }
}
