use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::capture::sequencer::CaptureTiming;
use crate::strip::export::DEFAULT_FILE_NAME;
use crate::strip::layout::StripLayout;
use crate::strip::treatment::Treatment;

/// Capture timing as stored in the config file, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub lead_in_ms: u64,
    pub countdown_from: u32,
    pub tick_ms: u64,
    pub inter_shot_ms: u64,
    pub flash_decay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            lead_in_ms: 3000,
            countdown_from: 3,
            tick_ms: 1000,
            inter_shot_ms: 2000,
            flash_decay_ms: 150,
        }
    }
}

impl From<&TimingConfig> for CaptureTiming {
    fn from(t: &TimingConfig) -> Self {
        Self {
            lead_in: Duration::from_millis(t.lead_in_ms),
            countdown_from: t.countdown_from,
            tick: Duration::from_millis(t.tick_ms),
            inter_shot: Duration::from_millis(t.inter_shot_ms),
            flash_decay: Duration::from_millis(t.flash_decay_ms),
        }
    }
}

/// Where the finished strip is written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    pub file_name: String,
    pub dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_FILE_NAME.to_string(),
            dir: ".".to_string(),
        }
    }
}

/// Top-level config file structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoothConfig {
    pub title: String,
    pub timing: TimingConfig,
    pub layout: StripLayout,
    pub export: ExportConfig,
    pub default_treatment: Treatment,
    pub log_filter: String,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            title: "Memory Booth".to_string(),
            timing: TimingConfig::default(),
            layout: StripLayout::default(),
            export: ExportConfig::default(),
            default_treatment: Treatment::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl BoothConfig {
    pub fn capture_timing(&self) -> CaptureTiming {
        CaptureTiming::from(&self.timing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_booth() {
        let config = BoothConfig::default();
        assert_eq!(config.title, "Memory Booth");
        assert_eq!(config.default_treatment, Treatment::Sepia);
        assert_eq!(config.export.file_name, "memory-booth-strip.png");
        assert_eq!(config.capture_timing(), CaptureTiming::default());
    }

    #[test]
    fn config_serialises_to_json() {
        let json = serde_json::to_value(BoothConfig::default()).unwrap();
        assert_eq!(json["title"], "Memory Booth");
        assert_eq!(json["timing"]["inter_shot_ms"], 2000);
        assert_eq!(json["layout"]["photo_width"], 380);
        assert_eq!(json["default_treatment"], "sepia");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{
            "title": "Wedding Booth",
            "timing": { "tick_ms": 500 },
            "default_treatment": "bw"
        }"#;

        let config: BoothConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.title, "Wedding Booth");
        assert_eq!(config.timing.tick_ms, 500);
        assert_eq!(config.timing.countdown_from, 3);
        assert_eq!(config.layout, StripLayout::default());
        assert_eq!(config.default_treatment, Treatment::BlackAndWhite);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut original = BoothConfig::default();
        original.export.dir = "/tmp/strips".to_string();
        original.timing.lead_in_ms = 0;
        let json = serde_json::to_string(&original).unwrap();
        let restored: BoothConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn timing_converts_to_durations() {
        let timing = TimingConfig {
            lead_in_ms: 10,
            countdown_from: 5,
            tick_ms: 20,
            inter_shot_ms: 30,
            flash_decay_ms: 40,
        };
        let capture = CaptureTiming::from(&timing);
        assert_eq!(capture.lead_in, Duration::from_millis(10));
        assert_eq!(capture.countdown_from, 5);
        assert_eq!(capture.tick, Duration::from_millis(20));
        assert_eq!(capture.inter_shot, Duration::from_millis(30));
        assert_eq!(capture.flash_decay, Duration::from_millis(40));
    }
}
