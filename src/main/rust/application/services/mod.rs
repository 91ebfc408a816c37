mod bridge_instance;
mod bridge_registry;
mod bridge_service;

pub use bridge_instance::{BridgeInstance, CancelFlag, RelaySettings};
pub use bridge_registry::BridgeRegistry;
pub use bridge_service::BridgeService;
