use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use base64::Engine;

/// Stable identifier of the device backing a capture source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a new `DeviceId` from a raw string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the inner string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single frame grabbed from a live source, in preview orientation.
pub struct Frame {
    /// Raw pixel data (packed RGB).
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Capture timestamp in microseconds.
    pub timestamp_us: u64,
}

/// An active handle on a frame-producing device.
///
/// Owned by exactly one sequencer at a time. The `live` flag drops to
/// `false` once the backend has stopped its tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSource {
    pub device_id: DeviceId,
    pub width: u32,
    pub height: u32,
    pub live: bool,
}

impl CaptureSource {
    /// Create a live source with the given native frame dimensions.
    pub fn new(device_id: DeviceId, width: u32, height: u32) -> Self {
        Self {
            device_id,
            width,
            height,
            live: true,
        }
    }

    pub fn is_live(&self) -> bool {
        self.live
    }
}

/// An immutable, mirror-corrected snapshot stored as an encoded PNG.
///
/// `index` is 1-based and follows capture order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub timestamp_us: u64,
    encoded: Arc<[u8]>,
}

impl RawFrame {
    pub fn new(index: usize, width: u32, height: u32, timestamp_us: u64, encoded: Vec<u8>) -> Self {
        Self {
            index,
            width,
            height,
            timestamp_us,
            encoded: encoded.into(),
        }
    }

    /// The encoded raster bytes.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// Render the stored raster as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.encoded)
        )
    }
}
