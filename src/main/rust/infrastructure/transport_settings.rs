use std::path::{Path, PathBuf};

use crate::domain::value_objects::NetworkAddress;

/// Default size of a shared-memory segment (matches shmsink's own default)
pub const DEFAULT_SHM_SIZE: u32 = 64 * 1024 * 1024;

/// Where transport endpoints live on this machine
#[derive(Debug, Clone, PartialEq)]
pub struct TransportSettings {
    shm_dir: PathBuf,
    shm_size: u32,
    network_peers: Vec<NetworkAddress>,
}

impl TransportSettings {
    pub fn new(shm_dir: PathBuf, shm_size: u32, network_peers: Vec<NetworkAddress>) -> Self {
        Self {
            shm_dir,
            shm_size,
            network_peers,
        }
    }

    /// Directory holding one control socket per shared-memory endpoint
    pub fn shm_dir(&self) -> &Path {
        &self.shm_dir
    }

    pub fn shm_socket_path(&self, name: &str) -> PathBuf {
        self.shm_dir.join(format!("{}.sock", name))
    }

    pub fn shm_size(&self) -> u32 {
        self.shm_size
    }

    /// Hosts probed when discovering network sources
    pub fn network_peers(&self) -> &[NetworkAddress] {
        &self.network_peers
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            shm_dir: std::env::temp_dir().join("frame-bridge"),
            shm_size: DEFAULT_SHM_SIZE,
            network_peers: Vec::new(),
        }
    }
}
