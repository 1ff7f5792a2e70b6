use thiserror::Error;

/// Capture subsystem errors.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("capture interrupted: {0}")]
    CaptureInterrupted(String),

    #[error("frame encoding failed: {0}")]
    Encode(String),

    #[error("a capture source is already live")]
    AlreadyLive,
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CaptureError>;
