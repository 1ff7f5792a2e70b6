//! The booth session: one owner for the frames, the capture state and the
//! selected treatment.
//!
//! Lifecycle is `create -> capture -> composite -> discard`. Capturing again
//! starts a new session and drops the previous frames and strip.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::camera::backend::CameraBackend;
use crate::camera::error::CaptureError;
use crate::camera::types::RawFrame;
use crate::capture::cue::CuePlayer;
use crate::capture::sequencer::{AbortHandle, CaptureSequencer, SequenceOutcome};
use crate::events::EventSink;
use crate::settings::types::BoothConfig;
use crate::strip::compositor::{StripArtifact, StripCompositor};
use crate::strip::error::StripError;
use crate::strip::export;
use crate::strip::treatment::Treatment;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionPhase {
    /// No frames held.
    Idle,
    /// A sequence stopped early; `captured` frames are kept.
    Incomplete { captured: usize },
    /// Every shot is stored and the strip can be composed.
    Captured,
    /// A strip has been produced from the current frames.
    Composited,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Incomplete { captured } => write!(f, "incomplete ({captured} frames)"),
            Self::Captured => f.write_str("captured"),
            Self::Composited => f.write_str("composited"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Strip(#[from] StripError),

    #[error("cannot {action} while session is {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: SessionPhase,
    },
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, SessionError>;

pub struct BoothSession {
    sequencer: CaptureSequencer,
    compositor: StripCompositor,
    default_treatment: Treatment,
    treatment: Treatment,
    artifact: Option<Arc<StripArtifact>>,
    phase: SessionPhase,
}

impl BoothSession {
    pub fn new(backend: Arc<dyn CameraBackend>, config: &BoothConfig) -> Self {
        Self {
            sequencer: CaptureSequencer::new(backend, config.capture_timing()),
            compositor: StripCompositor::new(config.layout, config.title.clone()),
            default_treatment: config.default_treatment,
            treatment: config.default_treatment,
            artifact: None,
            phase: SessionPhase::Idle,
        }
    }

    pub fn with_cue(mut self, cue: Arc<dyn CuePlayer>) -> Self {
        self.sequencer = self.sequencer.with_cue(cue);
        self
    }

    /// Route capture and compositing events to `events`.
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.sequencer = self.sequencer.with_events(Arc::clone(&events));
        self.compositor = self.compositor.with_events(events);
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn treatment(&self) -> Treatment {
        self.treatment
    }

    pub fn frames(&self) -> &[RawFrame] {
        self.sequencer.frames()
    }

    pub fn artifact(&self) -> Option<&Arc<StripArtifact>> {
        self.artifact.as_ref()
    }

    /// Handle for aborting a capture from another task.
    pub fn abort_handle(&self) -> AbortHandle {
        self.sequencer.abort_handle()
    }

    /// Run a full capture sequence, replacing any previous frames and strip.
    ///
    /// On an error the frames captured so far stay readable and `capture`
    /// can be called again.
    pub async fn capture(&mut self) -> Result<SequenceOutcome> {
        self.artifact = None;
        self.phase = SessionPhase::Idle;

        self.sequencer.start()?;
        let outcome = self.sequencer.run_sequence().await;

        self.phase = match outcome {
            Ok(SequenceOutcome::Completed) => SessionPhase::Captured,
            _ => SessionPhase::Incomplete {
                captured: self.sequencer.frames().len(),
            },
        };
        outcome.map_err(SessionError::from)
    }

    /// Select the treatment for the next composite.
    ///
    /// A strip that has already been produced keeps its treatment until
    /// [`composite`](Self::composite) is called again.
    pub fn select_treatment(&mut self, treatment: Treatment) {
        info!("treatment selected: {treatment} ({})", treatment.describe());
        self.treatment = treatment;
    }

    /// Compose the current frames with the selected treatment.
    pub async fn composite(&mut self) -> Result<Arc<StripArtifact>> {
        match self.phase {
            SessionPhase::Captured | SessionPhase::Composited => {}
            phase => {
                return Err(SessionError::InvalidPhase {
                    action: "composite",
                    phase,
                })
            }
        }

        let artifact = self
            .compositor
            .compose(self.sequencer.frames(), self.treatment)
            .await?;
        let artifact = Arc::new(artifact);
        self.artifact = Some(Arc::clone(&artifact));
        self.phase = SessionPhase::Composited;
        Ok(artifact)
    }

    /// Write the composed strip into `dir` under `file_name`.
    pub fn export(&self, dir: &Path, file_name: &str) -> Result<PathBuf> {
        let artifact = self.artifact.as_ref().ok_or(SessionError::InvalidPhase {
            action: "export",
            phase: self.phase,
        })?;
        Ok(export::save_to_dir(artifact, dir, file_name)?)
    }

    /// Drop frames, strip and treatment choice; release any live source.
    pub fn discard(&mut self) {
        self.sequencer.reset();
        self.artifact = None;
        self.treatment = self.default_treatment;
        self.phase = SessionPhase::Idle;
        info!("session discarded");
    }
}
