pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-exports for convenience
pub use application::services::{
    BridgeInstance, BridgeRegistry, BridgeService, CancelFlag, RelaySettings,
};
pub use config::Config;
pub use domain::entities::{BridgeLifecycle, RelayCounters, RelayStats, StateTransition};
pub use domain::errors::{DomainError, Result};
pub use domain::ports::{
    FrameSink, FrameSource, MetricsReporter, NoopMetrics, PullOutcome, RegistryObserver,
    TransportFactory,
};
pub use domain::services::{pack_uyvy, swap_red_blue, PixelConverter};
pub use domain::value_objects::{
    BridgeConfig, BridgeId, BridgeState, BridgeSummary, ColorSpace, ConnectRetryPolicy, Direction,
    NetworkAddress, PacingPolicy, Resolution, TransportKind, VideoFrame,
};
#[cfg(feature = "gstreamer")]
pub use infrastructure::gstreamer::{GstTransportFactory, PipelineBuilder};
pub use infrastructure::console::{run_console, LoggingObserver};
pub use infrastructure::metrics::{serve_metrics, PrometheusReporter};
pub use infrastructure::TransportSettings;
