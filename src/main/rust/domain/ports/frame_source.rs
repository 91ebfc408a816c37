use std::time::Duration;

use crate::domain::errors::Result;
use crate::domain::value_objects::{ColorSpace, Resolution, VideoFrame};

/// Outcome of a single pull
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// The frame buffer now holds a new frame
    Filled,
    /// Nothing arrived this tick
    Empty,
}

/// Port for the upstream side of a bridge
pub trait FrameSource: Send {
    /// Try once to attach to the endpoint called `name`.
    /// Returns the resolution the source currently delivers.
    fn try_connect(&mut self, name: &str, timeout: Duration) -> Result<Resolution>;

    /// Pull at most one frame into `frame`, resizing it when the source
    /// resolution changed. Implementations must not block longer than
    /// their configured pull timeout.
    fn pull_frame(&mut self, frame: &mut VideoFrame) -> Result<PullOutcome>;

    /// Channel order of the frames this source delivers
    fn pixel_layout(&self) -> ColorSpace {
        ColorSpace::Rgba
    }
}
