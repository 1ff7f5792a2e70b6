// Capture pipeline: timed shots, the capture cue and mirror-correction.

pub mod cue;
pub mod mirror;
pub mod sequencer;
