mod bridge_lifecycle;
mod relay_counters;

pub use bridge_lifecycle::{BridgeLifecycle, StateTransition};
pub use relay_counters::{RelayCounters, RelayStats};
