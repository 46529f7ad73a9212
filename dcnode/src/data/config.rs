use super::{Imsi, Lcid};
use crate::SplitPolicy;
use anyhow::{Result, ensure};
use dcx::{ControlFraming, Teid, TunnelKind};
use serde::Deserialize;
use slog::{Logger, error, info};
use std::fs;
use std::net::IpAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // IMSI of this UE.
    pub imsi: Imsi,

    // Address on which the DCX-C and DCX-U endpoints are bound, unless overridden per peer.
    pub local_ip: IpAddr,

    // Selects the fixed port pair.
    #[serde(default)]
    pub tunnel: TunnelKind,

    #[serde(default)]
    pub use_dual_connectivity: bool,

    #[serde(default)]
    pub use_in_sequence_delivery: bool,

    #[serde(default)]
    pub split_policy: SplitPolicy,

    #[serde(default)]
    pub control_framing: ControlFraming,

    #[serde(default)]
    pub peers: Vec<PeerConfig>,

    // Split bearers owned by this UE.
    #[serde(default)]
    pub bearers: Vec<BearerConfig>,

    // Split bearers of other UEs that this UE carries on its own radio link.
    #[serde(default)]
    pub relays: Vec<RelayConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeerConfig {
    pub imsi: Imsi,
    pub ip: IpAddr,
    pub local_ip: Option<IpAddr>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BearerConfig {
    pub lcid: Lcid,
    pub peer_imsi: Option<Imsi>,
    pub teid: Option<Teid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub lcid: Lcid,
    pub master_imsi: Imsi,
    pub teid: Teid,
}

impl Config {
    /// A config with no peers or bearers.
    pub fn new(imsi: Imsi, local_ip: IpAddr) -> Self {
        Config {
            imsi,
            local_ip,
            tunnel: TunnelKind::default(),
            use_dual_connectivity: false,
            use_in_sequence_delivery: false,
            split_policy: SplitPolicy::default(),
            control_framing: ControlFraming::default(),
            peers: vec![],
            bearers: vec![],
            relays: vec![],
        }
    }

    pub fn validate(&self) -> Result<()> {
        for bearer in &self.bearers {
            ensure!(
                bearer.peer_imsi.is_some() == bearer.teid.is_some(),
                "Bearer on LCID {} must have both or neither of peer_imsi and teid",
                bearer.lcid
            );
            if let Some(peer_imsi) = bearer.peer_imsi {
                ensure!(
                    self.peers.iter().any(|p| p.imsi == peer_imsi),
                    "Bearer on LCID {} refers to unknown peer {peer_imsi}",
                    bearer.lcid
                );
            }
        }
        for relay in &self.relays {
            ensure!(
                self.peers.iter().any(|p| p.imsi == relay.master_imsi),
                "Relay on LCID {} refers to unknown peer {}",
                relay.lcid,
                relay.master_imsi
            );
        }
        Ok(())
    }
}

/// Load the node configuration from a TOML file.
pub fn load_config_file(filename: &str, logger: &Logger) -> Result<Config> {
    let path = std::env::current_dir()?;
    let contents = fs::read_to_string(filename).inspect_err(|e| {
        error!(
            logger,
            "Failed to load config file {filename} (current directory {}) with error code {e}",
            path.display()
        )
    })?;
    let config: Config = toml::from_str(&contents)?;
    config.validate()?;
    info!(
        logger,
        "Loaded config for IMSI {} from {filename} - {} peers, {} bearers, {} relays",
        config.imsi,
        config.peers.len(),
        config.bearers.len(),
        config.relays.len()
    );
    Ok(config)
}
