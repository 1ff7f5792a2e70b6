//! Timed multi-shot capture.
//!
//! One sequential routine drives every shot: countdown ticks, the capture
//! cue and flash, the frame grab with mirror-correction, and the gap before
//! the next shot. Each wait is a suspension point that also listens for an
//! abort request.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::camera::backend::CameraBackend;
use crate::camera::error::{CaptureError, Result};
use crate::camera::types::{CaptureSource, RawFrame};
use crate::capture::cue::CuePlayer;
use crate::capture::mirror::mirror_horizontal;
use crate::codec;
use crate::events::{emit, BoothEvent, EventSink, ShotProgress};

/// Number of shots in one session.
pub const SHOT_COUNT: usize = 3;

/// Timing of the capture sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTiming {
    /// Delay between acquiring the source and the first countdown.
    pub lead_in: Duration,
    /// First value shown by the countdown.
    pub countdown_from: u32,
    /// Interval between countdown ticks.
    pub tick: Duration,
    /// Pause after a shot before the next countdown starts.
    pub inter_shot: Duration,
    /// Decay of the flash pulse.
    pub flash_decay: Duration,
}

impl Default for CaptureTiming {
    fn default() -> Self {
        Self {
            lead_in: Duration::from_secs(3),
            countdown_from: 3,
            tick: Duration::from_secs(1),
            inter_shot: Duration::from_secs(2),
            flash_decay: Duration::from_millis(150),
        }
    }
}

/// Where the sequencer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CaptureState {
    Idle,
    Live,
    CountingDown { shot: usize },
    Completed,
    Aborted,
    Failed,
}

/// How a sequence ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOutcome {
    Completed,
    Aborted { captured: usize },
}

/// Requests cancellation of a running sequence from outside it.
#[derive(Clone)]
pub struct AbortHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Drives the fixed sequence of timed shots against one capture source.
pub struct CaptureSequencer {
    backend: Arc<dyn CameraBackend>,
    cue: Option<Arc<dyn CuePlayer>>,
    events: Option<EventSink>,
    timing: CaptureTiming,
    source: Option<CaptureSource>,
    frames: Vec<RawFrame>,
    state: CaptureState,
    abort_tx: Arc<watch::Sender<bool>>,
    abort_rx: watch::Receiver<bool>,
}

impl CaptureSequencer {
    pub fn new(backend: Arc<dyn CameraBackend>, timing: CaptureTiming) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            backend,
            cue: None,
            events: None,
            timing,
            source: None,
            frames: Vec::with_capacity(SHOT_COUNT),
            state: CaptureState::Idle,
            abort_tx: Arc::new(tx),
            abort_rx: rx,
        }
    }

    /// Attach a best-effort capture cue.
    pub fn with_cue(mut self, cue: Arc<dyn CuePlayer>) -> Self {
        self.cue = Some(cue);
        self
    }

    /// Attach a progress sink.
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Frames captured so far, in capture order.
    pub fn frames(&self) -> &[RawFrame] {
        &self.frames
    }

    /// Whether a capture source is currently held.
    pub fn is_live(&self) -> bool {
        self.source.as_ref().is_some_and(CaptureSource::is_live)
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            tx: Arc::clone(&self.abort_tx),
        }
    }

    /// Acquire a fresh capture source.
    ///
    /// Frames from any previous run are discarded. On failure the sequencer
    /// stays idle and `start` may be retried.
    pub fn start(&mut self) -> Result<()> {
        if self.source.is_some() {
            return Err(CaptureError::AlreadyLive);
        }
        self.frames.clear();
        self.abort_tx.send_replace(false);

        match self.backend.acquire() {
            Ok(source) => {
                info!(
                    "capture source {} acquired ({}x{})",
                    source.device_id, source.width, source.height
                );
                self.source = Some(source);
                self.state = CaptureState::Live;
                Ok(())
            }
            Err(e) => {
                error!("failed to acquire capture source: {e}");
                self.state = CaptureState::Idle;
                emit(
                    self.events.as_ref(),
                    BoothEvent::Error {
                        message: e.to_string(),
                    },
                );
                Err(e)
            }
        }
    }

    /// Run every shot against the source acquired by [`start`](Self::start).
    ///
    /// Already captured frames survive an abort or a failure and stay
    /// readable through [`frames`](Self::frames). The source is released
    /// before this returns, whatever the outcome.
    pub async fn run_sequence(&mut self) -> Result<SequenceOutcome> {
        if self.source.is_none() {
            return Err(CaptureError::SourceUnavailable(
                "sequence started without a source".to_string(),
            ));
        }

        if self.pause(self.timing.lead_in).await {
            return Ok(self.finish_aborted());
        }

        for shot in 1..=SHOT_COUNT {
            if self.countdown(shot).await {
                return Ok(self.finish_aborted());
            }

            if let Err(e) = self.capture_shot(shot) {
                error!("shot {shot} failed: {e}");
                self.release_source();
                self.state = CaptureState::Failed;
                emit(
                    self.events.as_ref(),
                    BoothEvent::Error {
                        message: e.to_string(),
                    },
                );
                return Err(e);
            }

            if shot < SHOT_COUNT && self.pause(self.timing.inter_shot).await {
                return Ok(self.finish_aborted());
            }
        }

        self.release_source();
        self.state = CaptureState::Completed;
        info!("capture sequence complete with {} frames", self.frames.len());
        Ok(SequenceOutcome::Completed)
    }

    /// Abort outside a running sequence: stop the source, keep the frames.
    pub fn abort(&mut self) {
        self.abort_tx.send_replace(true);
        if self.source.is_some() {
            self.release_source();
            self.state = CaptureState::Aborted;
        }
    }

    /// Drop all frames and return to idle, releasing any live source.
    pub fn reset(&mut self) {
        self.release_source();
        self.frames.clear();
        self.abort_tx.send_replace(false);
        self.state = CaptureState::Idle;
    }

    /// Tick from `countdown_from` down to one, one tick interval apart.
    /// Returns `true` if aborted.
    async fn countdown(&mut self, shot: usize) -> bool {
        self.state = CaptureState::CountingDown { shot };
        for remaining in (1..=self.timing.countdown_from).rev() {
            debug!("shot {shot}: {remaining}");
            emit(
                self.events.as_ref(),
                BoothEvent::Countdown { shot, remaining },
            );
            if self.pause(self.timing.tick).await {
                return true;
            }
        }
        false
    }

    /// Cue, flash, grab, correct, store.
    fn capture_shot(&mut self, shot: usize) -> Result<()> {
        self.play_cue();
        emit(
            self.events.as_ref(),
            BoothEvent::Flash {
                shot,
                decay_ms: self.timing.flash_decay.as_millis() as u64,
            },
        );

        let source = self
            .source
            .as_ref()
            .ok_or_else(|| CaptureError::CaptureInterrupted("source was released".to_string()))?;
        let mut frame = self.backend.grab_frame(source)?;

        // The live feed is mirrored for display; store the true orientation.
        if !mirror_horizontal(&mut frame.data, frame.width, frame.height, 3) {
            return Err(CaptureError::CaptureInterrupted(format!(
                "frame of {} bytes does not match {}x{}",
                frame.data.len(),
                frame.width,
                frame.height
            )));
        }
        let encoded =
            codec::encode_png(&frame.data, frame.width, frame.height).map_err(CaptureError::Encode)?;

        let index = self.frames.len() + 1;
        debug_assert_eq!(index, shot);
        self.frames.push(RawFrame::new(
            index,
            frame.width,
            frame.height,
            frame.timestamp_us,
            encoded,
        ));
        info!("captured shot {index}/{SHOT_COUNT}");

        emit(
            self.events.as_ref(),
            BoothEvent::Captured(ShotProgress {
                shot_index: index,
                total: SHOT_COUNT,
            }),
        );
        Ok(())
    }

    fn play_cue(&self) {
        if let Some(cue) = &self.cue {
            match cue.play_cue() {
                Ok(()) => debug!("capture cue started"),
                Err(e) => warn!("capture cue skipped: {e}"),
            }
        }
    }

    /// Sleep for `duration` unless an abort arrives first.
    /// Returns `true` if aborted.
    async fn pause(&mut self, duration: Duration) -> bool {
        if *self.abort_rx.borrow_and_update() {
            return true;
        }
        let rx = &mut self.abort_rx;
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            changed = rx.wait_for(|aborted| *aborted) => return changed.is_ok(),
        }
        *self.abort_rx.borrow()
    }

    fn finish_aborted(&mut self) -> SequenceOutcome {
        self.release_source();
        self.state = CaptureState::Aborted;
        let captured = self.frames.len();
        warn!("capture sequence aborted after {captured} of {SHOT_COUNT} shots");
        SequenceOutcome::Aborted { captured }
    }

    /// Release the held source. The `Option` guarantees at most one release.
    fn release_source(&mut self) {
        if let Some(mut source) = self.source.take() {
            self.backend.release(&mut source);
            info!("capture source {} released", source.device_id);
        }
    }
}

impl Drop for CaptureSequencer {
    fn drop(&mut self) {
        self.release_source();
    }
}
