//! main - runs one DC node on real UDP sockets

use anyhow::{Result, ensure};
use async_channel::{Receiver, Sender};
use async_std::prelude::*;
use atomic_counter::AtomicCounter;
use clap::Parser;
use dcnode::{
    BearerCounters, Datagram, DcxCounters, Imsi, Lcid, LocalStack, UdpEndpointProvider,
    UeDataUnit, UeNode, UpperLayer, bearer_counter_indices as bc, dcx_counter_indices as dc,
};
use dcx::{RrcReconfiguration, RrcReconfigurationCompleted};
use futures_lite::FutureExt;
use pdcp::{PdcpPdu, PdcpTag};
use signal_hook::consts::signal::*;
use signal_hook_async_std::Signals;
use slog::{Drain, Logger, debug, info, o, warn};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file describing this UE, its peers and its bearers.
    #[arg(long, default_value = "dcnode.toml")]
    config: String,

    /// Overrides the local IP in the config file.  The DCX-C and DCX-U endpoints are bound on
    /// this address.  If neither is given, or the config says 0.0.0.0, the eth0 address is used.
    #[arg(long)]
    local_ip: Option<IpAddr>,

    /// How often to log counters.
    #[arg(long, default_value_t = 5)]
    stats_interval_secs: u64,

    /// If set, send a test SDU on every bearer at this interval.
    #[arg(long)]
    generate_traffic_ms: Option<u64>,
}

// There is no radio link in this binary.  PDUs for the local stack are logged and discarded.
struct DiscardingStack {
    logger: Logger,
}

impl LocalStack for DiscardingStack {
    fn transmit_pdcp_pdu(&mut self, lcid: Lcid, pdu: PdcpPdu, _tag: PdcpTag) {
        debug!(self.logger, "LCID {lcid} local stack << {}", hex::encode(&pdu.0));
    }
}

struct LoggingUpperLayer {
    logger: Logger,
}

impl UpperLayer for LoggingUpperLayer {
    fn receive_pdcp_sdu(&mut self, lcid: Lcid, sdu: Vec<u8>) {
        debug!(self.logger, "LCID {lcid} delivered SDU of {} bytes", sdu.len());
    }

    fn recv_ue_data(&mut self, unit: UeDataUnit) {
        info!(self.logger, "UE data {unit}");
    }

    fn recv_reconfiguration(
        &mut self,
        source_imsi: Imsi,
        _target_imsi: Imsi,
        message: RrcReconfiguration,
    ) {
        info!(
            self.logger,
            "RRC reconfiguration from IMSI {source_imsi}: {}",
            hex::encode(&message.0)
        );
    }

    fn recv_reconfiguration_completed(
        &mut self,
        source_imsi: Imsi,
        _target_imsi: Imsi,
        message: RrcReconfigurationCompleted,
    ) {
        info!(
            self.logger,
            "RRC reconfiguration completed from IMSI {source_imsi}, transaction {}",
            message.rrc_transaction_identifier
        );
    }
}

enum Event {
    Datagram(Datagram),
    Signal(i32),
    GenerateTraffic,
    Closed,
}

#[async_std::main]
async fn main() -> Result<()> {
    exit_on_panic();
    let logger = init_logging();

    let args = Args::parse();
    let mut config = dcnode::load_config_file(&args.config, &logger)?;
    if let Some(local_ip) = args.local_ip {
        config.local_ip = local_ip;
    } else if config.local_ip.is_unspecified() {
        config.local_ip = local_ip_address::local_ip()?;
        info!(logger, "Using local IP {}", config.local_ip);
    }
    check_local_ip(&config.local_ip)?;

    let (provider, datagrams) = UdpEndpointProvider::new(logger.clone());
    let stack = DiscardingStack {
        logger: logger.new(o!("stack" => 1)),
    };
    let upper = LoggingUpperLayer {
        logger: logger.new(o!("upper" => 1)),
    };
    let mut node = UeNode::from_config(&config, provider, stack, upper, &logger)?;

    let _stats_task = async_std::task::spawn(dump_stats(
        logger.clone(),
        Duration::from_secs(args.stats_interval_secs),
        node.dcx_counters(),
        node.bearer_counters(),
    ));

    let (tick_sender, ticks) = async_channel::unbounded();
    if let Some(ms) = args.generate_traffic_ms {
        async_std::task::spawn(tick(Duration::from_millis(ms), tick_sender));
    }

    let signals = Signals::new([SIGHUP, SIGTERM, SIGINT, SIGQUIT])?;
    let handle = signals.handle();
    let (sig_sender, sig_receiver) = async_channel::unbounded();
    let signals_task = async_std::task::spawn(handle_signals(signals, sig_sender));

    let lcids: Vec<Lcid> = config.bearers.iter().map(|b| b.lcid).collect();
    let mut sdu_count: u64 = 0;
    loop {
        match next_event(&datagrams, &sig_receiver, &ticks).await {
            Event::Datagram(datagram) => node.on_datagram(datagram.endpoint, &datagram.bytes)?,
            Event::GenerateTraffic => {
                for lcid in &lcids {
                    node.transmit(*lcid, &test_sdu(sdu_count))?;
                    sdu_count += 1;
                }
            }
            Event::Signal(signal) => {
                info!(logger, "Caught signal {signal} - shutting down");
                break;
            }
            Event::Closed => {
                warn!(logger, "Event source closed - shutting down");
                break;
            }
        }
    }

    handle.close();
    signals_task.await;
    Ok(())
}

async fn next_event(
    datagrams: &Receiver<Datagram>,
    signals: &Receiver<i32>,
    ticks: &Receiver<()>,
) -> Event {
    let datagram = async {
        datagrams
            .recv()
            .await
            .map_or(Event::Closed, Event::Datagram)
    };
    let signal = async { signals.recv().await.map_or(Event::Closed, Event::Signal) };
    let tick = async {
        match ticks.recv().await {
            Ok(()) => Event::GenerateTraffic,
            Err(_) => futures_lite::future::pending().await,
        }
    };
    signal.or(datagram).or(tick).await
}

// Room for IPv4 and UDP headers, then a count and a send timestamp, padded to 100 bytes.
fn test_sdu(count: u64) -> Vec<u8> {
    let mut sdu = vec![0u8; 28];
    sdu.extend_from_slice(&count.to_be_bytes());
    let micros = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_micros() as u64);
    sdu.extend_from_slice(&micros.to_be_bytes());
    sdu.resize(100, 0);
    sdu
}

async fn tick(interval: Duration, sender: Sender<()>) {
    loop {
        async_std::task::sleep(interval).await;
        if sender.send(()).await.is_err() {
            break;
        }
    }
}

fn init_logging() -> Logger {
    // Use info level logging by default
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info") }
    }
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog_envlogger::new(drain);
    slog::Logger::root(drain, o!())
}

fn exit_on_panic() {
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        std::process::exit(1);
    }));
}

fn check_local_ip(ip: &IpAddr) -> Result<()> {
    ensure!(
        !ip.is_unspecified(),
        "Unspecified IP address not allowed for local IP - this must be an address that the peer UEs can send to"
    );
    Ok(())
}

async fn handle_signals(signals: Signals, sig_sender: Sender<i32>) {
    let mut signals = signals.fuse();
    while let Some(signal) = signals.next().await {
        match signal {
            SIGHUP => {
                // Config is only read at startup.
            }
            SIGTERM | SIGINT | SIGQUIT => {
                let _ = sig_sender.send(signal).await;
            }
            _ => unreachable!(),
        }
    }
}

async fn dump_stats(
    logger: Logger,
    interval: Duration,
    dcx: Arc<DcxCounters>,
    bearers: Vec<(Lcid, Arc<BearerCounters>)>,
) {
    let mut last_dcx = [0usize; dc::NUM_COUNTERS];
    let mut last_bearers = vec![[0usize; bc::NUM_COUNTERS]; bearers.len()];

    loop {
        async_std::task::sleep(interval).await;

        if dcx[dc::RX_DATA_DATAGRAMS].get() != last_dcx[dc::RX_DATA_DATAGRAMS]
            || dcx[dc::TX_DATA_DATAGRAMS].get() != last_dcx[dc::TX_DATA_DATAGRAMS]
            || dcx[dc::RX_CONTROL_DATAGRAMS].get() != last_dcx[dc::RX_CONTROL_DATAGRAMS]
        {
            for idx in 0..dc::FIRST_DROP {
                last_dcx[idx] = dcx[idx].get();
            }
            info!(
                &logger,
                "DCX rx ctrl={} data pkts={} bytes={} tx data pkts={} bytes={}",
                last_dcx[dc::RX_CONTROL_DATAGRAMS],
                last_dcx[dc::RX_DATA_DATAGRAMS],
                last_dcx[dc::RX_DATA_BYTES],
                last_dcx[dc::TX_DATA_DATAGRAMS],
                last_dcx[dc::TX_DATA_BYTES]
            );
        }

        let mut dcx_warn_needed = false;
        for idx in dc::FIRST_DROP..dc::NUM_COUNTERS {
            if last_dcx[idx] != dcx[idx].get() {
                dcx_warn_needed = true;
            }
            last_dcx[idx] = dcx[idx].get();
        }
        if dcx_warn_needed {
            warn!(
                &logger,
                "DCX DROPS bad_ctrl={} bad_data={} suppressed={} no_consumer={} tx_failed={}",
                last_dcx[dc::DROP_UNDECODABLE_CONTROL],
                last_dcx[dc::DROP_UNDECODABLE_DATA],
                last_dcx[dc::DROP_SUPPRESSED],
                last_dcx[dc::DROP_NO_CONSUMER],
                last_dcx[dc::DROP_TX_FAILED]
            );
        }

        for ((lcid, counters), last) in bearers.iter().zip(last_bearers.iter_mut()) {
            if counters[bc::TX_PDUS].get() == last[bc::TX_PDUS]
                && counters[bc::RX_PDUS].get() == last[bc::RX_PDUS]
                && (bc::FIRST_WARN..bc::NUM_COUNTERS).all(|idx| counters[idx].get() == last[idx])
            {
                continue;
            }
            for idx in 0..bc::NUM_COUNTERS {
                last[idx] = counters[idx].get();
            }
            let mean_delay_us = last[bc::RX_DELAY_MICROS]
                .checked_div(last[bc::RX_PDUS])
                .unwrap_or(0);
            info!(
                &logger,
                "LCID {lcid} tx={} (local={} remote={}) rx={} delivered={} mean_delay_us={} forced={} short={} bad={}",
                last[bc::TX_PDUS],
                last[bc::TX_LOCAL],
                last[bc::TX_REMOTE],
                last[bc::RX_PDUS],
                last[bc::DELIVERED_SDUS],
                mean_delay_us,
                last[bc::FORCED_ADVANCES],
                last[bc::SHORT_SDUS],
                last[bc::DROP_BAD_PDU]
            );
        }
    }
}
