use std::sync::Arc;

use serde::Serialize;

use crate::strip::compositor::StripArtifact;

/// Progress of the capture sequence after a shot lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotProgress {
    pub shot_index: usize,
    pub total: usize,
}

impl ShotProgress {
    /// Text for the progress counter, e.g. `"2/3"`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.shot_index, self.total)
    }

    /// Completed share in `[0.0, 1.0]`, for a progress bar.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.shot_index as f64 / self.total as f64).min(1.0)
    }
}

/// Everything the booth reports to its progress/UI sink.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoothEvent {
    /// A countdown tick before `shot`.
    Countdown { shot: usize, remaining: u32 },
    /// Visual flash pulse at the capture instant.
    #[serde(rename_all = "camelCase")]
    Flash { shot: usize, decay_ms: u64 },
    /// A frame was stored.
    Captured(ShotProgress),
    /// The strip finished rendering.
    Ready { artifact: Arc<StripArtifact> },
    /// A capture or compositing failure.
    Error { message: String },
}

/// Callback receiving booth events. Invoked on whichever task produced the
/// event.
pub type EventSink = Arc<dyn Fn(BoothEvent) + Send + Sync>;

/// Emit to an optional sink.
pub(crate) fn emit(sink: Option<&EventSink>, event: BoothEvent) {
    if let Some(sink) = sink {
        sink(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_label_and_fraction() {
        let progress = ShotProgress {
            shot_index: 2,
            total: 3,
        };
        assert_eq!(progress.label(), "2/3");
        assert!((progress.fraction() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn progress_fraction_with_zero_total() {
        let progress = ShotProgress {
            shot_index: 0,
            total: 0,
        };
        assert_eq!(progress.fraction(), 0.0);
    }

    #[test]
    fn captured_event_serialises_flat() {
        let event = BoothEvent::Captured(ShotProgress {
            shot_index: 1,
            total: 3,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "captured");
        assert_eq!(json["shotIndex"], 1);
        assert_eq!(json["total"], 3);
    }

    #[test]
    fn flash_event_serialises_to_camelcase() {
        let event = BoothEvent::Flash {
            shot: 2,
            decay_ms: 150,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "flash");
        assert_eq!(json["decayMs"], 150);
    }

    #[test]
    fn error_event_carries_message() {
        let event = BoothEvent::Error {
            message: "capture source unavailable: permission denied".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(
            json["message"],
            "capture source unavailable: permission denied"
        );
    }

    #[test]
    fn event_sink_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EventSink>();
    }
}
