mod bridge_config;
mod bridge_id;
mod bridge_state;
mod bridge_summary;
mod color_space;
mod direction;
mod frame;
mod network_address;
mod pacing_policy;
mod retry_policy;

pub use bridge_config::{BridgeConfig, MAX_NAME_LEN};
pub use bridge_id::BridgeId;
pub use bridge_state::BridgeState;
pub use bridge_summary::BridgeSummary;
pub use color_space::ColorSpace;
pub use direction::{Direction, TransportKind};
pub use frame::{Resolution, VideoFrame};
pub use network_address::NetworkAddress;
pub use pacing_policy::PacingPolicy;
pub use retry_policy::ConnectRetryPolicy;
