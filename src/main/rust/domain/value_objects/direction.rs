use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::errors::DomainError;

/// The two video sharing mechanisms a bridge can connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Local frame sharing through a named shared-memory socket
    SharedMemory,
    /// Frames streamed over TCP, endpoints addressed as host:port
    Network,
}

impl TransportKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SharedMemory => "shm",
            Self::Network => "net",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TransportKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shm" | "shared-memory" => Ok(Self::SharedMemory),
            "net" | "network" => Ok(Self::Network),
            _ => Err(DomainError::UnknownTransportKind(s.to_string())),
        }
    }
}

/// Which transport plays source and which plays sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    SharedMemoryToNetwork,
    NetworkToSharedMemory,
}

impl Direction {
    pub fn source_kind(&self) -> TransportKind {
        match self {
            Self::SharedMemoryToNetwork => TransportKind::SharedMemory,
            Self::NetworkToSharedMemory => TransportKind::Network,
        }
    }

    pub fn sink_kind(&self) -> TransportKind {
        match self {
            Self::SharedMemoryToNetwork => TransportKind::Network,
            Self::NetworkToSharedMemory => TransportKind::SharedMemory,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-to-{}", self.source_kind(), self.sink_kind())
    }
}

impl FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shm-to-net" | "a-to-b" => Ok(Self::SharedMemoryToNetwork),
            "net-to-shm" | "b-to-a" => Ok(Self::NetworkToSharedMemory),
            _ => Err(DomainError::UnknownDirection(s.to_string())),
        }
    }
}
