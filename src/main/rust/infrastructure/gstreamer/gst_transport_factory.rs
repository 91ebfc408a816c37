use std::sync::Arc;
use std::time::Duration;

use super::{GstFrameSink, GstFrameSource, PipelineBuilder};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{FrameSink, FrameSource, TransportFactory};
use crate::domain::value_objects::{ColorSpace, TransportKind};
use crate::infrastructure::discovery;
use crate::infrastructure::TransportSettings;

/// Creates GStreamer-backed endpoints for both transport kinds
pub struct GstTransportFactory {
    settings: Arc<TransportSettings>,
    pull_timeout: Duration,
}

impl GstTransportFactory {
    pub fn new(settings: TransportSettings, pull_timeout: Duration) -> Self {
        Self {
            settings: Arc::new(settings),
            pull_timeout,
        }
    }

    fn ensure_elements(elements: &[&str]) -> Result<()> {
        if let Some(missing) = elements
            .iter()
            .find(|name| gstreamer::ElementFactory::find(name).is_none())
        {
            return Err(DomainError::HandleAcquisitionFailed(format!(
                "GStreamer element '{}' is not installed",
                missing
            )));
        }
        Ok(())
    }

    fn ensure_shm_dir(&self) -> Result<()> {
        std::fs::create_dir_all(self.settings.shm_dir()).map_err(|e| {
            DomainError::HandleAcquisitionFailed(format!(
                "{}: {}",
                self.settings.shm_dir().display(),
                e
            ))
        })
    }
}

impl TransportFactory for GstTransportFactory {
    fn acquire_source(&self, kind: TransportKind) -> Result<Box<dyn FrameSource>> {
        Self::ensure_elements(PipelineBuilder::source_elements(kind))?;
        Ok(Box::new(GstFrameSource::new(
            kind,
            self.settings.clone(),
            self.pull_timeout,
        )))
    }

    fn acquire_sink(
        &self,
        kind: TransportKind,
        color_space: ColorSpace,
    ) -> Result<Box<dyn FrameSink>> {
        Self::ensure_elements(PipelineBuilder::sink_elements(kind))?;
        if kind == TransportKind::SharedMemory {
            self.ensure_shm_dir()?;
        }
        Ok(Box::new(GstFrameSink::new(
            kind,
            color_space,
            self.settings.clone(),
        )))
    }

    fn discover_sources(&self, kind: TransportKind, timeout: Duration) -> Vec<String> {
        match kind {
            TransportKind::SharedMemory => discovery::list_shared_memory_sources(self.settings.shm_dir()),
            TransportKind::Network => {
                discovery::probe_network_sources(self.settings.network_peers(), timeout)
            }
        }
    }
}
