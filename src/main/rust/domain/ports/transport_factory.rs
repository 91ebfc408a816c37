use std::time::Duration;

use crate::domain::errors::Result;
use crate::domain::ports::{FrameSink, FrameSource};
use crate::domain::value_objects::{ColorSpace, TransportKind};

/// Port creating transport endpoints for a given transport kind
pub trait TransportFactory: Send + Sync {
    /// Acquire an unconnected source handle. Must not block.
    fn acquire_source(&self, kind: TransportKind) -> Result<Box<dyn FrameSource>>;

    /// Acquire an unpublished sink handle emitting `color_space`. Must not block.
    fn acquire_sink(&self, kind: TransportKind, color_space: ColorSpace)
        -> Result<Box<dyn FrameSink>>;

    /// Names of the sources currently discoverable on `kind`, within `timeout`
    fn discover_sources(&self, kind: TransportKind, timeout: Duration) -> Vec<String>;
}
