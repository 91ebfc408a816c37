use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid bridge name: {0}")]
    InvalidBridgeName(String),

    #[error("Invalid source name: {0}")]
    InvalidSourceName(String),

    #[error("Invalid network address: {0} (expected host:port)")]
    InvalidNetworkAddress(String),

    #[error("Invalid retry policy: at least one connection attempt is required")]
    InvalidRetryPolicy,

    #[error("Invalid frame rate: must be between 1 and 1000")]
    InvalidFrameRate,

    #[error("Unknown color space: {0}")]
    UnknownColorSpace(String),

    #[error("Unknown direction: {0}")]
    UnknownDirection(String),

    #[error("Unknown transport kind: {0}")]
    UnknownTransportKind(String),

    #[error("Failed to acquire transport handle: {0}")]
    HandleAcquisitionFailed(String),

    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Pull failed: {0}")]
    PullFailed(String),

    #[error("A bridge named {0} is already published")]
    DuplicateBridgeName(String),

    #[error("Bridge not found: {0}")]
    BridgeNotFound(String),

    #[error("Bridge index {index} out of range ({len} bridges)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Bridge service is shutting down")]
    ShuttingDown,
}

impl DomainError {
    /// Errors a bridge creation can end with; surfaced to the user as a start failure
    pub fn is_start_error(&self) -> bool {
        matches!(
            self,
            Self::HandleAcquisitionFailed(_) | Self::ConnectFailed(_) | Self::ShuttingDown
        )
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
