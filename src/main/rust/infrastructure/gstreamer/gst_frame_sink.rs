use std::sync::Arc;

use gstreamer::prelude::*;
use gstreamer_app::AppSrc;

use super::pipeline_builder::{PipelineBuilder, APPSRC_NAME};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::FrameSink;
use crate::domain::value_objects::{ColorSpace, Resolution, TransportKind};
use crate::infrastructure::TransportSettings;

struct SinkSession {
    name: String,
    pipeline: gstreamer::Pipeline,
    appsrc: AppSrc,
    resolution: Resolution,
}

impl Drop for SinkSession {
    fn drop(&mut self) {
        let _ = self.appsrc.end_of_stream();
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}

/// Frame sink publishing a GDP stream fed through an appsrc
pub struct GstFrameSink {
    kind: TransportKind,
    color_space: ColorSpace,
    settings: Arc<TransportSettings>,
    session: Option<SinkSession>,
}

impl GstFrameSink {
    pub fn new(kind: TransportKind, color_space: ColorSpace, settings: Arc<TransportSettings>) -> Self {
        Self {
            kind,
            color_space,
            settings,
            session: None,
        }
    }

    fn publish(&self, name: &str, resolution: Resolution) -> Result<SinkSession> {
        let pipeline_str = PipelineBuilder::build_sink_string(self.kind, name, &self.settings)?;
        tracing::debug!("Creating sink pipeline: {}", pipeline_str);

        let pipeline = gstreamer::parse::launch(&pipeline_str)
            .map_err(|e| DomainError::PublishFailed(e.to_string()))?
            .downcast::<gstreamer::Pipeline>()
            .map_err(|_| DomainError::PublishFailed("Failed to downcast to Pipeline".to_string()))?;

        let appsrc = pipeline
            .by_name(APPSRC_NAME)
            .and_then(|element| element.downcast::<AppSrc>().ok())
            .ok_or_else(|| DomainError::PublishFailed("Pipeline has no appsrc".to_string()))?;

        appsrc.set_caps(Some(&self.caps(resolution)));

        let session = SinkSession {
            name: name.to_string(),
            pipeline,
            appsrc,
            resolution,
        };

        session
            .pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| DomainError::PublishFailed(format!("{}: {}", name, e)))?;

        tracing::info!(name = %name, resolution = %resolution, kind = %self.kind, "Endpoint published");
        Ok(session)
    }

    fn caps(&self, resolution: Resolution) -> gstreamer::Caps {
        gstreamer::Caps::builder("video/x-raw")
            .field("format", self.color_space.caps_format())
            .field("width", resolution.width() as i32)
            .field("height", resolution.height() as i32)
            .field("framerate", gstreamer::Fraction::new(0, 1))
            .build()
    }
}

impl FrameSink for GstFrameSink {
    fn ensure_published(&mut self, name: &str, resolution: Resolution) -> Result<()> {
        let current = self
            .session
            .as_ref()
            .filter(|session| session.name == name)
            .map(|session| session.resolution);

        match current {
            Some(published) if published == resolution => Ok(()),
            Some(_) => {
                let caps = self.caps(resolution);
                if let Some(session) = self.session.as_mut() {
                    session.appsrc.set_caps(Some(&caps));
                    session.resolution = resolution;
                }
                tracing::debug!(name = %name, resolution = %resolution, "Endpoint resized");
                Ok(())
            }
            None => {
                self.session = None;
                self.session = Some(self.publish(name, resolution)?);
                Ok(())
            }
        }
    }

    fn push_frame(&mut self, payload: &[u8], resolution: Resolution) -> Result<()> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| DomainError::SendFailed("endpoint is not published".to_string()))?;

        if session.resolution != resolution {
            return Err(DomainError::SendFailed(format!(
                "frame is {} but endpoint is {}",
                resolution, session.resolution
            )));
        }

        let buffer = gstreamer::Buffer::from_slice(payload.to_vec());
        session
            .appsrc
            .push_buffer(buffer)
            .map_err(|e| DomainError::SendFailed(format!("{:?}", e)))?;
        Ok(())
    }
}
