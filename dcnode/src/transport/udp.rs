use super::{Datagram, EndpointId, EndpointProvider};
use anyhow::{Context, Result, anyhow};
use async_channel::{Receiver, Sender};
use async_std::net::UdpSocket;
use slog::{Logger, debug, info, warn};
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use stop_token::StopSource;
use stop_token::prelude::*;

const MAX_DATAGRAM_LEN: usize = 2000;

struct UdpEndpoint {
    outbound: Sender<(SocketAddr, Vec<u8>)>,
    _stop_source: StopSource,
}

/// Endpoint provider backed by real UDP sockets.  Each endpoint has a receive task that
/// forwards datagrams onto a shared channel, and a send task that drains the endpoint's
/// outbound queue, until the endpoint is closed.
///
/// The socket is non-blocking, so all I/O on it goes through the async tasks.  `send_to`
/// only queues, and a send that fails in the kernel is logged by the send task.
pub struct UdpEndpointProvider {
    endpoints: HashMap<EndpointId, UdpEndpoint>,
    next_id: u32,
    sender: Sender<Datagram>,
    logger: Logger,
}

impl UdpEndpointProvider {
    pub fn new(logger: Logger) -> (Self, Receiver<Datagram>) {
        let (sender, receiver) = async_channel::unbounded();
        (
            UdpEndpointProvider {
                endpoints: HashMap::new(),
                next_id: 0,
                sender,
                logger,
            },
            receiver,
        )
    }
}

impl EndpointProvider for UdpEndpointProvider {
    fn create_endpoint(&mut self, local_addr: SocketAddr) -> Result<EndpointId> {
        let socket: UdpSocket = bind_udp_socket(local_addr)?.into();
        let socket = Arc::new(socket);
        let recv_socket = socket.clone();

        let id = EndpointId(self.next_id);
        self.next_id += 1;

        let stop_source = StopSource::new();
        let stop_token = stop_source.token();

        let (outbound, queued) = async_channel::unbounded::<(SocketAddr, Vec<u8>)>();
        let logger = self.logger.clone();
        async_std::task::spawn(
            async move {
                while let Ok((remote_addr, bytes)) = queued.recv().await {
                    if let Err(e) = socket.send_to(&bytes, remote_addr).await {
                        warn!(logger, "{id} failed to send to {remote_addr} - {e}");
                    }
                }
            }
            .timeout_at(stop_token.clone()),
        );

        let sender = self.sender.clone();
        let logger = self.logger.clone();
        async_std::task::spawn(
            async move {
                let mut buf = [0u8; MAX_DATAGRAM_LEN];
                loop {
                    match recv_socket.recv_from(&mut buf).await {
                        Ok((bytes_read, _peer)) => {
                            let datagram = Datagram {
                                endpoint: id,
                                bytes: buf[..bytes_read].to_vec(),
                            };
                            if sender.send(datagram).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(logger, "Exiting receive loop of {id} with error {e}");
                            break;
                        }
                    }
                }
            }
            .timeout_at(stop_token),
        );

        info!(self.logger, "Bound {id} on {local_addr}");
        self.endpoints.insert(
            id,
            UdpEndpoint {
                outbound,
                _stop_source: stop_source,
            },
        );
        Ok(id)
    }

    fn send_to(
        &mut self,
        endpoint: EndpointId,
        remote_addr: SocketAddr,
        bytes: &[u8],
    ) -> Result<()> {
        let udp_endpoint = self
            .endpoints
            .get(&endpoint)
            .ok_or_else(|| anyhow!("No such endpoint {endpoint}"))?;
        udp_endpoint
            .outbound
            .try_send((remote_addr, bytes.to_vec()))
            .map_err(|_| anyhow!("Send task of {endpoint} has exited"))?;
        Ok(())
    }

    fn close_endpoint(&mut self, endpoint: EndpointId) {
        // Dropping the stop source ends both tasks.
        if self.endpoints.remove(&endpoint).is_some() {
            debug!(self.logger, "Closed {endpoint}");
        }
    }
}

fn bind_udp_socket(local_addr: SocketAddr) -> Result<std::net::UdpSocket> {
    let domain = match local_addr.ip() {
        IpAddr::V4(_) => Domain::IPV4,
        IpAddr::V6(_) => Domain::IPV6,
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    socket
        .bind(&local_addr.into())
        .context(format!("Failed to bind {local_addr}"))?;
    Ok(socket.into())
}
