use crate::domain::errors::{DomainError, Result};
use crate::domain::value_objects::{NetworkAddress, TransportKind};
use crate::infrastructure::TransportSettings;

/// Name of the appsink a source pipeline hands frames to
pub const APPSINK_NAME: &str = "relay_sink";
/// Name of the appsrc a sink pipeline receives frames from
pub const APPSRC_NAME: &str = "relay_src";

pub struct PipelineBuilder;

impl PipelineBuilder {
    /// Build the pipeline that receives frames from endpoint `name`.
    /// Frames are GDP-framed on the wire so caps travel with them, and are
    /// normalized to RGBA before reaching the appsink.
    pub fn build_source_string(
        kind: TransportKind,
        name: &str,
        settings: &TransportSettings,
    ) -> Result<String> {
        let endpoint = match kind {
            TransportKind::SharedMemory => format!(
                "shmsrc socket-path={} is-live=true",
                quote(&settings.shm_socket_path(name).to_string_lossy())
            ),
            TransportKind::Network => {
                let addr = parse_address(name)?;
                format!(
                    "tcpclientsrc host={} port={}",
                    quote(addr.host()),
                    addr.port()
                )
            }
        };

        Ok(format!(
            "{} ! \
             gdpdepay ! \
             videoconvert ! \
             video/x-raw,format=RGBA ! \
             appsink name={} sync=false max-buffers=1 drop=true",
            endpoint, APPSINK_NAME
        ))
    }

    /// Build the pipeline that publishes frames as endpoint `name`.
    /// The appsrc caps are set at publish time, once the resolution is known.
    pub fn build_sink_string(
        kind: TransportKind,
        name: &str,
        settings: &TransportSettings,
    ) -> Result<String> {
        let endpoint = match kind {
            TransportKind::SharedMemory => format!(
                "shmsink socket-path={} shm-size={} wait-for-connection=false sync=false",
                quote(&settings.shm_socket_path(name).to_string_lossy()),
                settings.shm_size()
            ),
            TransportKind::Network => {
                let addr = parse_address(name)?;
                format!(
                    "tcpserversink host={} port={} sync=false",
                    quote(addr.host()),
                    addr.port()
                )
            }
        };

        Ok(format!(
            "appsrc name={} is-live=true format=time do-timestamp=true ! \
             gdppay ! \
             {}",
            APPSRC_NAME, endpoint
        ))
    }

    /// Element factories a source of `kind` needs
    pub fn source_elements(kind: TransportKind) -> &'static [&'static str] {
        match kind {
            TransportKind::SharedMemory => &["shmsrc", "gdpdepay", "videoconvert", "appsink"],
            TransportKind::Network => &["tcpclientsrc", "gdpdepay", "videoconvert", "appsink"],
        }
    }

    /// Element factories a sink of `kind` needs
    pub fn sink_elements(kind: TransportKind) -> &'static [&'static str] {
        match kind {
            TransportKind::SharedMemory => &["appsrc", "gdppay", "shmsink"],
            TransportKind::Network => &["appsrc", "gdppay", "tcpserversink"],
        }
    }
}

fn parse_address(name: &str) -> Result<NetworkAddress> {
    name.parse::<NetworkAddress>()
        .map_err(|_| DomainError::InvalidNetworkAddress(name.to_string()))
}

/// Quote a property value for the gst-launch syntax
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
