use thiserror::Error;

/// Strip compositing and export errors.
#[derive(Debug, Error)]
pub enum StripError {
    #[error("expected {expected} frames, got {actual}")]
    FrameCount { expected: usize, actual: usize },

    #[error("frames out of order: position {position} holds frame #{index}")]
    FrameOrder { position: usize, index: usize },

    #[error("frame #{index} could not be decoded: {reason}")]
    Decode { index: usize, reason: String },

    #[error("strip rendering failed: {0}")]
    Render(String),

    #[error("strip export failed: {0}")]
    Export(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, StripError>;
