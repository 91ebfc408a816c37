pub mod console;
pub mod discovery;
#[cfg(feature = "gstreamer")]
pub mod gstreamer;
pub mod metrics;
mod transport_settings;

pub use transport_settings::{TransportSettings, DEFAULT_SHM_SIZE};
