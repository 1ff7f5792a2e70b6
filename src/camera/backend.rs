use crate::camera::error::Result;
use crate::camera::types::{CaptureSource, Frame};

/// Platform-agnostic frame source.
///
/// A backend hands out a [`CaptureSource`] on `acquire`, produces frames
/// from it in preview (mirrored) orientation, and stops the underlying
/// tracks on `release`.
pub trait CameraBackend: Send + Sync {
    /// Start the device and return a live source.
    ///
    /// Fails with `SourceUnavailable` when permission is denied or no
    /// device is present.
    fn acquire(&self) -> Result<CaptureSource>;

    /// Grab the current frame from a live source.
    fn grab_frame(&self, source: &CaptureSource) -> Result<Frame>;

    /// Stop the source's tracks. Called exactly once per acquired source.
    fn release(&self, source: &mut CaptureSource);
}
