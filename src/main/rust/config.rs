use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::application::services::RelaySettings;
use crate::domain::value_objects::{
    BridgeConfig, ColorSpace, ConnectRetryPolicy, NetworkAddress, PacingPolicy,
};
use crate::infrastructure::{TransportSettings, DEFAULT_SHM_SIZE};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "frame-bridge",
    version = "0.1.0",
    about = "Relays live video frames between shared-memory and network transports"
)]
pub struct Config {
    /// Directory holding shared-memory endpoint sockets
    #[arg(long, env = "SHM_DIR")]
    pub shm_dir: Option<PathBuf>,

    /// Size in bytes of each published shared-memory segment
    #[arg(long, env = "SHM_SIZE", default_value_t = DEFAULT_SHM_SIZE)]
    pub shm_size: u32,

    /// Network peers (host:port) probed when listing network sources
    #[arg(long, env = "NETWORK_PEERS", value_delimiter = ',')]
    pub network_peers: Vec<String>,

    /// Connection attempts before a bridge gives up on its source
    #[arg(long, default_value = "10")]
    pub connect_attempts: u32,

    /// Delay between connection attempts in milliseconds
    #[arg(long, default_value = "100")]
    pub connect_interval_ms: u64,

    /// Relay loop rate in frames per second
    #[arg(long, env = "FRAME_RATE", default_value = "60")]
    pub frame_rate: u32,

    /// Longest a source may block waiting for one frame, in milliseconds
    #[arg(long, default_value = "16")]
    pub pull_timeout_ms: u64,

    /// Time budget for listing sources, in milliseconds
    #[arg(long, default_value = "1000")]
    pub discovery_timeout_ms: u64,

    /// Metrics server port
    #[arg(long, env = "METRICS_PORT", default_value = "9003")]
    pub metrics_port: u16,

    /// Bridge to start at launch, as "direction,source,name[,color]" (repeatable)
    #[arg(long = "create", value_name = "BRIDGE")]
    pub create: Vec<String>,

    /// Run without the interactive console (stop with Ctrl+C)
    #[arg(long)]
    pub no_console: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Minimum allowed port (ports below 1024 are privileged)
const MIN_USER_PORT: u16 = 1024;

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        Self::validate_port(self.metrics_port, "metrics")?;

        if self.shm_size == 0 {
            anyhow::bail!("Shared-memory segment size cannot be 0");
        }

        if self.connect_attempts == 0 {
            anyhow::bail!("Connect attempts must be at least 1");
        }

        if self.pull_timeout_ms == 0 {
            anyhow::bail!("Pull timeout cannot be 0");
        }

        if self.discovery_timeout_ms == 0 {
            anyhow::bail!("Discovery timeout cannot be 0");
        }

        self.to_relay_settings()
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        self.to_transport_settings()?;
        self.to_startup_bridges()?;

        Ok(())
    }

    fn validate_port(port: u16, name: &str) -> anyhow::Result<()> {
        if port == 0 {
            anyhow::bail!("Invalid {} port: port cannot be 0", name);
        }
        if port < MIN_USER_PORT {
            anyhow::bail!(
                "Invalid {} port: {} is a privileged port (< {}). Use a port >= {}",
                name,
                port,
                MIN_USER_PORT,
                MIN_USER_PORT
            );
        }
        Ok(())
    }

    pub fn to_relay_settings(&self) -> crate::domain::errors::Result<RelaySettings> {
        Ok(RelaySettings {
            retry: ConnectRetryPolicy::new(
                self.connect_attempts,
                Duration::from_millis(self.connect_interval_ms),
            )?,
            pacing: PacingPolicy::new(self.frame_rate, self.pull_timeout())?,
        })
    }

    pub fn to_transport_settings(&self) -> anyhow::Result<TransportSettings> {
        let peers = self
            .network_peers
            .iter()
            .filter(|peer| !peer.trim().is_empty())
            .map(|peer| {
                peer.trim()
                    .parse::<NetworkAddress>()
                    .map_err(|e| anyhow::anyhow!("Invalid network peer '{}': {}", peer, e))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let shm_dir = self
            .shm_dir
            .clone()
            .unwrap_or_else(|| TransportSettings::default().shm_dir().to_path_buf());

        Ok(TransportSettings::new(shm_dir, self.shm_size, peers))
    }

    /// Bridges requested with `--create`
    pub fn to_startup_bridges(&self) -> anyhow::Result<Vec<BridgeConfig>> {
        self.create
            .iter()
            .map(|spec| {
                Self::parse_bridge_spec(spec)
                    .map_err(|e| anyhow::anyhow!("Invalid --create '{}': {}", spec, e))
            })
            .collect()
    }

    fn parse_bridge_spec(spec: &str) -> anyhow::Result<BridgeConfig> {
        let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
        if parts.len() < 3 || parts.len() > 4 {
            anyhow::bail!("expected direction,source,name[,color]");
        }

        let color_space = match parts.get(3) {
            Some(color) => color.parse()?,
            None => ColorSpace::default(),
        };

        Ok(BridgeConfig::new(
            parts[1].to_string(),
            parts[2].to_string(),
            parts[0].parse()?,
            color_space,
        )?)
    }

    pub fn pull_timeout(&self) -> Duration {
        Duration::from_millis(self.pull_timeout_ms)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }
}
