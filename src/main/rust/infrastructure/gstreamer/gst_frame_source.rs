use std::sync::Arc;
use std::time::{Duration, Instant};

use gstreamer::prelude::*;
use gstreamer_app::AppSink;

use super::pipeline_builder::{PipelineBuilder, APPSINK_NAME};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{FrameSource, PullOutcome};
use crate::domain::value_objects::{Resolution, TransportKind, VideoFrame};
use crate::infrastructure::TransportSettings;

struct SourceSession {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    /// Sample pulled while probing the connection, delivered on the next pull
    pending: Option<gstreamer::Sample>,
}

impl Drop for SourceSession {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}

/// Wait before reopening a source whose upstream went away
const REOPEN_INTERVAL: Duration = Duration::from_millis(500);

/// Decides when a lost upstream is tried again
#[derive(Debug)]
struct ReopenSchedule {
    interval: Duration,
    next_attempt: Option<Instant>,
}

impl ReopenSchedule {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_attempt: None,
        }
    }

    /// The upstream was lost (or a reopen failed) at `now`
    fn lost(&mut self, now: Instant) {
        self.next_attempt = Some(now + self.interval);
    }

    fn is_due(&self, now: Instant) -> bool {
        matches!(self.next_attempt, Some(at) if now >= at)
    }

    fn reopened(&mut self) {
        self.next_attempt = None;
    }
}

/// Frame source reading a GDP stream through an appsink.
///
/// When the upstream disappears (a pipeline error or end of stream) the
/// pipeline is torn down and reopened on later pulls, at most once per
/// `REOPEN_INTERVAL`. Pulls report `Empty` meanwhile.
pub struct GstFrameSource {
    kind: TransportKind,
    settings: Arc<TransportSettings>,
    pull_timeout: Duration,
    name: Option<String>,
    session: Option<SourceSession>,
    reopen: ReopenSchedule,
}

impl GstFrameSource {
    pub fn new(kind: TransportKind, settings: Arc<TransportSettings>, pull_timeout: Duration) -> Self {
        Self {
            kind,
            settings,
            pull_timeout,
            name: None,
            session: None,
            reopen: ReopenSchedule::new(REOPEN_INTERVAL),
        }
    }

    fn reopen_if_due(&mut self) -> Result<PullOutcome> {
        let name = self
            .name
            .clone()
            .ok_or_else(|| DomainError::PullFailed("source is not connected".to_string()))?;

        let now = Instant::now();
        if !self.reopen.is_due(now) {
            return Ok(PullOutcome::Empty);
        }

        match self.open(&name) {
            Ok(session) => {
                tracing::info!(source = %name, "Source reopened");
                self.session = Some(session);
                self.reopen.reopened();
            }
            Err(e) => {
                tracing::debug!(source = %name, error = %e, "Source still unavailable");
                self.reopen.lost(now);
            }
        }
        Ok(PullOutcome::Empty)
    }

    fn open(&self, name: &str) -> Result<SourceSession> {
        let pipeline_str = PipelineBuilder::build_source_string(self.kind, name, &self.settings)?;
        tracing::debug!("Creating source pipeline: {}", pipeline_str);

        let pipeline = gstreamer::parse::launch(&pipeline_str)
            .map_err(|e| DomainError::ConnectFailed(e.to_string()))?
            .downcast::<gstreamer::Pipeline>()
            .map_err(|_| DomainError::ConnectFailed("Failed to downcast to Pipeline".to_string()))?;

        let appsink = pipeline
            .by_name(APPSINK_NAME)
            .and_then(|element| element.downcast::<AppSink>().ok())
            .ok_or_else(|| DomainError::ConnectFailed("Pipeline has no appsink".to_string()))?;

        // the session owns the pipeline from here so every exit path resets it
        let session = SourceSession {
            pipeline,
            appsink,
            pending: None,
        };

        session
            .pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| DomainError::ConnectFailed(format!("{}: {}", name, e)))?;

        Ok(session)
    }
}

impl FrameSource for GstFrameSource {
    fn try_connect(&mut self, name: &str, timeout: Duration) -> Result<Resolution> {
        self.session = None;
        self.name = Some(name.to_string());
        self.reopen.reopened();
        let mut session = self.open(name)?;

        let sample = session
            .appsink
            .try_pull_sample(clock_time(timeout))
            .ok_or_else(|| {
                let reason = lost_reason(&session)
                    .unwrap_or_else(|| format!("no frame from '{}' within {:?}", name, timeout));
                DomainError::ConnectFailed(reason)
            })?;

        let resolution = sample_resolution(&sample)?;
        session.pending = Some(sample);
        self.session = Some(session);
        Ok(resolution)
    }

    fn pull_frame(&mut self, frame: &mut VideoFrame) -> Result<PullOutcome> {
        let pull_timeout = clock_time(self.pull_timeout);
        let pulled = match self.session.as_mut() {
            None => return self.reopen_if_due(),
            Some(session) => match session.pending.take() {
                Some(sample) => Ok(sample),
                None => session
                    .appsink
                    .try_pull_sample(pull_timeout)
                    .ok_or_else(|| lost_reason(session)),
            },
        };

        let sample = match pulled {
            Ok(sample) => sample,
            Err(None) => return Ok(PullOutcome::Empty),
            Err(Some(reason)) => {
                tracing::debug!(kind = %self.kind, reason = %reason, "Upstream lost, reopening later");
                self.session = None;
                self.reopen.lost(Instant::now());
                return Err(DomainError::PullFailed(reason));
            }
        };

        let resolution = sample_resolution(&sample)?;
        frame.resize(resolution);

        let buffer = sample
            .buffer()
            .ok_or_else(|| DomainError::PullFailed("sample carries no buffer".to_string()))?;
        let map = buffer
            .map_readable()
            .map_err(|e| DomainError::PullFailed(e.to_string()))?;

        let data = frame.data_mut();
        let len = data.len().min(map.len());
        data[..len].copy_from_slice(&map.as_slice()[..len]);

        Ok(PullOutcome::Filled)
    }
}

/// Saturates at the longest representable clock time
fn clock_time(duration: Duration) -> gstreamer::ClockTime {
    let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
    gstreamer::ClockTime::from_nseconds(nanos.min(gstreamer::ClockTime::MAX.nseconds()))
}

/// Why the session stopped delivering, if it did
fn lost_reason(session: &SourceSession) -> Option<String> {
    bus_error(&session.pipeline).or_else(|| {
        session
            .appsink
            .is_eos()
            .then(|| "end of stream".to_string())
    })
}

fn sample_resolution(sample: &gstreamer::Sample) -> Result<Resolution> {
    let structure = sample
        .caps()
        .and_then(|caps| caps.structure(0))
        .ok_or_else(|| DomainError::PullFailed("sample carries no caps".to_string()))?;

    let width = structure
        .get::<i32>("width")
        .map_err(|e| DomainError::PullFailed(e.to_string()))?;
    let height = structure
        .get::<i32>("height")
        .map_err(|e| DomainError::PullFailed(e.to_string()))?;

    Ok(Resolution::new(width.max(0) as u32, height.max(0) as u32))
}

/// First error message waiting on the pipeline bus, if any
fn bus_error(pipeline: &gstreamer::Pipeline) -> Option<String> {
    let bus = pipeline.bus()?;
    let msg = bus.pop_filtered(&[gstreamer::MessageType::Error])?;
    match msg.view() {
        gstreamer::MessageView::Error(err) => Some(format!(
            "Error from {:?}: {} ({:?})",
            err.src().map(|s| s.path_string()),
            err.error(),
            err.debug()
        )),
        _ => None,
    }
}
