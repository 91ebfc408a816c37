use std::fmt;

use serde::Serialize;

/// Lifecycle states of a bridge worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeState {
    /// Constructed, nothing acquired yet
    #[default]
    Created,
    /// Acquiring transport handles
    Starting,
    /// Waiting for the source to appear
    Connecting,
    /// Relaying frames
    Running,
    /// Cancel observed, releasing handles
    Stopping,
    /// Fully torn down
    Stopped,
    /// Gave up before reaching Running, or the worker died
    Failed,
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Starting => write!(f, "STARTING"),
            Self::Connecting => write!(f, "CONNECTING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Stopping => write!(f, "STOPPING"),
            Self::Stopped => write!(f, "STOPPED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

impl BridgeState {
    /// Convert state to numeric value for metrics
    pub fn as_metric(&self) -> f64 {
        match self {
            Self::Created => 0.0,
            Self::Starting => 1.0,
            Self::Connecting => 2.0,
            Self::Running => 3.0,
            Self::Stopping => 4.0,
            Self::Stopped => 5.0,
            Self::Failed => 6.0,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// No further transitions happen from here
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }
}
