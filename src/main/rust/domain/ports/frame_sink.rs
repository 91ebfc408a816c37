use crate::domain::errors::Result;
use crate::domain::value_objects::Resolution;

/// Port for the downstream side of a bridge
pub trait FrameSink: Send {
    /// Publish the endpoint `name` at `resolution`.
    /// Creates it on first call, resizes it when the resolution changed,
    /// and does nothing otherwise.
    fn ensure_published(&mut self, name: &str, resolution: Resolution) -> Result<()>;

    /// Send one frame already laid out in the sink's color space
    fn push_frame(&mut self, payload: &[u8], resolution: Resolution) -> Result<()>;
}
