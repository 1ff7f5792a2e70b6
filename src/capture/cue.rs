//! Capture cue: the short three-part sound marking the capture instant.
//!
//! The cue is a fixed fingerprint: a descending square-wave click, a
//! triangle-wave shutter release, and a two-step sine chime. Playback is a
//! best-effort capability injected into the sequencer; a missing or broken
//! audio device never affects capture.

use thiserror::Error;

/// Oscillator shape for a single cue voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Square,
    Triangle,
    Sine,
}

/// How a voice's pitch moves over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pitch {
    /// Exponential glide from `from` Hz to `to` Hz across the voice.
    Glide { from: f32, to: f32 },
    /// Holds `first` Hz, then jumps to `second` Hz at `switch_at` seconds.
    Step {
        first: f32,
        second: f32,
        switch_at: f32,
    },
}

/// One oscillator in the cue, with offsets relative to the capture instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueVoice {
    pub waveform: Waveform,
    pub start: f32,
    pub stop: f32,
    pub pitch: Pitch,
    pub gain_from: f32,
    pub gain_to: f32,
}

/// Total length of the cue in seconds.
pub const CUE_LENGTH_SECS: f32 = 0.25;

/// The capture cue fingerprint.
pub const CAPTURE_CUE: [CueVoice; 3] = [
    // Mechanical click
    CueVoice {
        waveform: Waveform::Square,
        start: 0.0,
        stop: 0.03,
        pitch: Pitch::Glide {
            from: 800.0,
            to: 200.0,
        },
        gain_from: 0.3,
        gain_to: 0.01,
    },
    // Shutter release
    CueVoice {
        waveform: Waveform::Triangle,
        start: 0.03,
        stop: 0.08,
        pitch: Pitch::Glide {
            from: 1200.0,
            to: 400.0,
        },
        gain_from: 0.2,
        gain_to: 0.01,
    },
    // Chime
    CueVoice {
        waveform: Waveform::Sine,
        start: 0.10,
        stop: 0.25,
        pitch: Pitch::Step {
            first: 1400.0,
            second: 1800.0,
            switch_at: 0.15,
        },
        gain_from: 0.15,
        gain_to: 0.01,
    },
];

impl CueVoice {
    pub fn is_active(&self, t: f32) -> bool {
        t >= self.start && t < self.stop
    }

    fn progress(&self, t: f32) -> f32 {
        ((t - self.start) / (self.stop - self.start)).clamp(0.0, 1.0)
    }

    /// Instantaneous frequency in Hz at `t` seconds after the capture instant.
    pub fn frequency_at(&self, t: f32) -> f32 {
        match self.pitch {
            Pitch::Glide { from, to } => exp_ramp(from, to, self.progress(t)),
            Pitch::Step {
                first,
                second,
                switch_at,
            } => {
                if t < switch_at {
                    first
                } else {
                    second
                }
            }
        }
    }

    /// Envelope gain at `t`; exponential decay across the voice.
    pub fn gain_at(&self, t: f32) -> f32 {
        exp_ramp(self.gain_from, self.gain_to, self.progress(t))
    }
}

fn exp_ramp(from: f32, to: f32, p: f32) -> f32 {
    from * (to / from).powf(p)
}

fn oscillate(waveform: Waveform, phase: f32) -> f32 {
    let frac = phase.fract();
    match waveform {
        Waveform::Square => {
            if frac < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Triangle => 1.0 - 4.0 * (frac - 0.5).abs(),
        Waveform::Sine => (std::f32::consts::TAU * frac).sin(),
    }
}

/// Render the cue as mono f32 samples in `[-1.0, 1.0]`.
pub fn synthesize(sample_rate: u32) -> Vec<f32> {
    let rate = sample_rate.max(1) as f32;
    let len = (CUE_LENGTH_SECS * rate).round() as usize;
    let mut phases = [0.0f32; CAPTURE_CUE.len()];
    let mut out = Vec::with_capacity(len);

    for n in 0..len {
        let t = n as f32 / rate;
        let mut sample = 0.0;
        for (voice, phase) in CAPTURE_CUE.iter().zip(phases.iter_mut()) {
            if !voice.is_active(t) {
                continue;
            }
            sample += oscillate(voice.waveform, *phase) * voice.gain_at(t);
            *phase = (*phase + voice.frequency_at(t) / rate).fract();
        }
        out.push(sample.clamp(-1.0, 1.0));
    }
    out
}

/// Cue playback failures. Never escalated past the sequencer.
#[derive(Debug, Error)]
pub enum CueError {
    #[error("no audio output device")]
    NoDevice,

    #[error("audio stream failed: {0}")]
    Stream(String),
}

/// Best-effort capture cue playback.
///
/// Implementations must return promptly; the sound plays in the background.
pub trait CuePlayer: Send + Sync {
    fn play_cue(&self) -> Result<(), CueError>;
}

/// Plays the cue on the default output device through cpal.
#[cfg(feature = "audio")]
pub struct CpalCuePlayer;

#[cfg(feature = "audio")]
impl CuePlayer for CpalCuePlayer {
    fn play_cue(&self) -> Result<(), CueError> {
        // cpal streams are not Send on every host, so the stream lives and
        // dies on its own thread.
        std::thread::Builder::new()
            .name("capture-cue".to_string())
            .spawn(|| {
                if let Err(e) = play_blocking() {
                    tracing::warn!("capture cue playback failed: {e}");
                }
            })
            .map_err(|e| CueError::Stream(e.to_string()))?;
        Ok(())
    }
}

#[cfg(feature = "audio")]
fn play_blocking() -> Result<(), CueError> {
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(CueError::NoDevice)?;
    let supported = device
        .default_output_config()
        .map_err(|e| CueError::Stream(e.to_string()))?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(CueError::Stream(format!(
            "unsupported sample format {:?}",
            supported.sample_format()
        )));
    }

    let config: cpal::StreamConfig = supported.into();
    let channels = usize::from(config.channels).max(1);
    let samples = synthesize(config.sample_rate.0);
    let duration =
        std::time::Duration::from_secs_f32(samples.len() as f32 / config.sample_rate.0 as f32);

    let mut cursor = 0usize;
    let stream = device
        .build_output_stream(
            &config,
            move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in out.chunks_mut(channels) {
                    let sample = samples.get(cursor).copied().unwrap_or(0.0);
                    cursor += 1;
                    frame.fill(sample);
                }
            },
            |err| tracing::warn!("capture cue stream error: {err}"),
            None,
        )
        .map_err(|e| CueError::Stream(e.to_string()))?;

    stream.play().map_err(|e| CueError::Stream(e.to_string()))?;
    std::thread::sleep(duration + std::time::Duration::from_millis(50));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 48_000;

    fn window(samples: &[f32], from: f32, to: f32) -> &[f32] {
        let a = (from * RATE as f32) as usize;
        let b = (to * RATE as f32) as usize;
        &samples[a..b]
    }

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn cue_is_250ms_long() {
        let samples = synthesize(RATE);
        assert_eq!(samples.len(), 12_000);
    }

    #[test]
    fn samples_stay_in_range() {
        let samples = synthesize(RATE);
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn voices_follow_fixed_offsets() {
        let [click, shutter, chime] = CAPTURE_CUE;
        assert_eq!(click.waveform, Waveform::Square);
        assert_eq!((click.start, click.stop), (0.0, 0.03));
        assert_eq!(shutter.waveform, Waveform::Triangle);
        assert_eq!((shutter.start, shutter.stop), (0.03, 0.08));
        assert_eq!(chime.waveform, Waveform::Sine);
        assert_eq!((chime.start, chime.stop), (0.10, 0.25));
    }

    #[test]
    fn click_glides_from_800_to_200() {
        let click = CAPTURE_CUE[0];
        assert!((click.frequency_at(0.0) - 800.0).abs() < 0.01);
        assert!((click.frequency_at(0.03) - 200.0).abs() < 0.01);
        // Exponential midpoint is the geometric mean
        assert!((click.frequency_at(0.015) - 400.0).abs() < 0.5);
    }

    #[test]
    fn chime_steps_from_1400_to_1800() {
        let chime = CAPTURE_CUE[2];
        assert_eq!(chime.frequency_at(0.12), 1400.0);
        assert_eq!(chime.frequency_at(0.15), 1800.0);
        assert_eq!(chime.frequency_at(0.2), 1800.0);
    }

    #[test]
    fn gain_decays_to_floor() {
        for voice in CAPTURE_CUE {
            assert!((voice.gain_at(voice.start) - voice.gain_from).abs() < 1e-6);
            assert!((voice.gain_at(voice.stop) - voice.gain_to).abs() < 1e-6);
        }
    }

    #[test]
    fn gap_between_shutter_and_chime_is_silent() {
        let samples = synthesize(RATE);
        assert_eq!(peak(window(&samples, 0.081, 0.099)), 0.0);
    }

    #[test]
    fn every_voice_is_audible() {
        let samples = synthesize(RATE);
        assert!(peak(window(&samples, 0.0, 0.01)) > 0.2);
        assert!(peak(window(&samples, 0.03, 0.045)) > 0.05);
        assert!(peak(window(&samples, 0.10, 0.12)) > 0.05);
    }

    #[test]
    fn cue_player_trait_object_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn CuePlayer>();
    }
}
