mod frame_sink;
mod frame_source;
mod metrics_reporter;
mod registry_observer;
mod transport_factory;

pub use frame_sink::FrameSink;
pub use frame_source::{FrameSource, PullOutcome};
pub use metrics_reporter::{MetricsReporter, NoopMetrics};
pub use registry_observer::RegistryObserver;
pub use transport_factory::TransportFactory;
