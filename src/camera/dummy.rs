use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::camera::backend::CameraBackend;
use crate::camera::error::{CaptureError, Result};
use crate::camera::types::{CaptureSource, DeviceId, Frame};

const DUMMY_DEVICE_ID: &str = "dummy:test:camera-001";
const DEFAULT_WIDTH: u32 = 64;
const DEFAULT_HEIGHT: u32 = 48;

/// Fault injection knobs.
#[derive(Debug, Default, Clone, Copy)]
struct Faults {
    deny_acquire: bool,
    lose_after_grabs: Option<usize>,
}

/// A fake camera backend for running the booth without real hardware.
///
/// The simulated scene is a red gradient rising left to right with a white
/// marker band on the scene's left edge. Frames are delivered the way a
/// selfie preview shows them, i.e. mirrored, so the marker arrives on the
/// right. Each grab shifts the green channel so consecutive shots differ.
pub struct DummyBackend {
    width: u32,
    height: u32,
    faults: Mutex<Faults>,
    acquires: AtomicUsize,
    grabs: AtomicUsize,
    releases: AtomicUsize,
}

impl DummyBackend {
    /// Create a backend with the default 64x48 resolution.
    pub fn new() -> Self {
        Self::with_resolution(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    pub fn with_resolution(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            faults: Mutex::new(Faults::default()),
            acquires: AtomicUsize::new(0),
            grabs: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        }
    }

    /// The stable device ID for the dummy camera.
    pub fn device_id() -> DeviceId {
        DeviceId::new(DUMMY_DEVICE_ID)
    }

    /// Make subsequent `acquire` calls fail as if permission were denied.
    pub fn deny_acquire(&self, deny: bool) {
        self.faults.lock().deny_acquire = deny;
    }

    /// Simulate the device disappearing after `grabs` successful frames.
    pub fn lose_source_after(&self, grabs: Option<usize>) {
        self.faults.lock().lose_after_grabs = grabs;
    }

    pub fn acquire_count(&self) -> usize {
        self.acquires.load(Ordering::SeqCst)
    }

    pub fn grab_count(&self) -> usize {
        self.grabs.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Width of the white marker band on the scene's left edge.
    pub fn marker_width(&self) -> u32 {
        (self.width / 8).max(1)
    }

    /// Render the scene in true orientation.
    pub fn scene(&self, shot: usize) -> Vec<u8> {
        let green = ((shot * 60) % 256) as u8;
        let marker = self.marker_width();
        let mut data = Vec::with_capacity((self.width * self.height * 3) as usize);
        for _y in 0..self.height {
            for x in 0..self.width {
                if x < marker {
                    data.extend_from_slice(&[255, 255, 255]);
                } else {
                    let red = ((x * 255) / self.width.max(1)) as u8;
                    data.extend_from_slice(&[red, green, 32]);
                }
            }
        }
        data
    }

    /// Render the scene as the mirrored preview delivers it.
    fn preview(&self, shot: usize) -> Vec<u8> {
        let scene = self.scene(shot);
        let row_len = (self.width * 3) as usize;
        let mut data = Vec::with_capacity(scene.len());
        for row in scene.chunks_exact(row_len) {
            for px in row.chunks_exact(3).rev() {
                data.extend_from_slice(px);
            }
        }
        data
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for DummyBackend {
    fn acquire(&self) -> Result<CaptureSource> {
        if self.faults.lock().deny_acquire {
            return Err(CaptureError::SourceUnavailable(
                "permission denied".to_string(),
            ));
        }
        self.acquires.fetch_add(1, Ordering::SeqCst);
        Ok(CaptureSource::new(
            Self::device_id(),
            self.width,
            self.height,
        ))
    }

    fn grab_frame(&self, source: &CaptureSource) -> Result<Frame> {
        if !source.is_live() {
            return Err(CaptureError::CaptureInterrupted(
                "source is stopped".to_string(),
            ));
        }
        let taken = self.grabs.load(Ordering::SeqCst);
        if let Some(limit) = self.faults.lock().lose_after_grabs {
            if taken >= limit {
                return Err(CaptureError::CaptureInterrupted(
                    "device disconnected".to_string(),
                ));
            }
        }
        let shot = self.grabs.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Frame {
            data: self.preview(shot),
            width: self.width,
            height: self.height,
            timestamp_us: shot as u64 * 1_000_000,
        })
    }

    fn release(&self, source: &mut CaptureSource) {
        source.live = false;
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_backend_device_id_is_stable() {
        let id1 = DummyBackend::device_id();
        let id2 = DummyBackend::device_id();
        assert_eq!(id1, id2);
        assert_eq!(id1.as_str(), "dummy:test:camera-001");
    }

    #[test]
    fn acquire_returns_live_source_at_native_size() {
        let backend = DummyBackend::with_resolution(32, 16);
        let source = backend.acquire().unwrap();
        assert!(source.is_live());
        assert_eq!((source.width, source.height), (32, 16));
        assert_eq!(backend.acquire_count(), 1);
    }

    #[test]
    fn denied_acquire_reports_source_unavailable() {
        let backend = DummyBackend::new();
        backend.deny_acquire(true);
        assert!(matches!(
            backend.acquire(),
            Err(CaptureError::SourceUnavailable(_))
        ));
        assert_eq!(backend.acquire_count(), 0);
    }

    #[test]
    fn grabbed_frame_is_mirrored_scene() {
        let backend = DummyBackend::with_resolution(16, 2);
        let source = backend.acquire().unwrap();
        let frame = backend.grab_frame(&source).unwrap();

        assert_eq!(frame.data.len(), 16 * 2 * 3);
        // Marker sits on the right in preview orientation
        let last = (15 * 3) as usize;
        assert_eq!(&frame.data[last..last + 3], &[255, 255, 255]);
        assert_ne!(&frame.data[0..3], &[255, 255, 255]);
    }

    #[test]
    fn consecutive_grabs_differ() {
        let backend = DummyBackend::new();
        let source = backend.acquire().unwrap();
        let a = backend.grab_frame(&source).unwrap();
        let b = backend.grab_frame(&source).unwrap();
        assert_ne!(a.data, b.data);
        assert!(b.timestamp_us > a.timestamp_us);
        assert_eq!(backend.grab_count(), 2);
    }

    #[test]
    fn lost_source_interrupts_capture() {
        let backend = DummyBackend::new();
        backend.lose_source_after(Some(1));
        let source = backend.acquire().unwrap();
        assert!(backend.grab_frame(&source).is_ok());
        assert!(matches!(
            backend.grab_frame(&source),
            Err(CaptureError::CaptureInterrupted(_))
        ));
    }

    #[test]
    fn grab_from_released_source_fails() {
        let backend = DummyBackend::new();
        let mut source = backend.acquire().unwrap();
        backend.release(&mut source);
        assert!(!source.is_live());
        assert_eq!(backend.release_count(), 1);
        assert!(backend.grab_frame(&source).is_err());
    }

    #[test]
    fn dummy_backend_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DummyBackend>();
    }
}
