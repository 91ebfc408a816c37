use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::domain::value_objects::NetworkAddress;

const SOCKET_EXTENSION: &str = "sock";

/// Names of the shared-memory endpoints with a control socket in `dir`, sorted
pub fn list_shared_memory_sources(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "Shared-memory directory not readable");
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some(SOCKET_EXTENSION))
        .filter_map(|path| path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string))
        .collect();

    names.sort();
    names.dedup();
    names
}

/// Peers accepting a TCP connection within `timeout`, in configuration order.
/// Peers are probed concurrently so the whole call stays within `timeout`
/// plus name resolution.
pub fn probe_network_sources(peers: &[NetworkAddress], timeout: Duration) -> Vec<String> {
    thread::scope(|scope| {
        let probes: Vec<_> = peers
            .iter()
            .map(|peer| scope.spawn(move || is_reachable(peer, timeout).then(|| peer.to_string())))
            .collect();

        probes
            .into_iter()
            .filter_map(|probe| probe.join().ok().flatten())
            .collect()
    })
}

fn is_reachable(peer: &NetworkAddress, timeout: Duration) -> bool {
    let addrs = match (peer.host(), peer.port()).to_socket_addrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            tracing::debug!(peer = %peer, error = %e, "Peer name resolution failed");
            return false;
        }
    };

    addrs
        .into_iter()
        .any(|addr| TcpStream::connect_timeout(&addr, timeout).is_ok())
}
