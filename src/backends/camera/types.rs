// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

/// Result type for camera operations
pub type CameraResult<T> = Result<T, CameraError>;

/// Frame receiver type for live streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Frame sender type for live streams
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

/// Which way a camera points relative to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Towards the user (selfie / front / integrated webcam)
    #[default]
    User,
    /// Away from the user (rear camera)
    Environment,
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::User => write!(f, "user"),
            FacingMode::Environment => write!(f, "environment"),
        }
    }
}

/// What a stream request asks for
///
/// `facing_mode` is an ideal constraint: sources prefer a matching device and
/// fall back to any device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing_mode: FacingMode,
    /// Audio is never captured; sources reject `true`
    pub audio: bool,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::User,
            audio: false,
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    /// Capture device path (`/dev/videoN`), empty for the PipeWire default camera
    pub path: String,
    /// Driver name from V4L2 QUERYCAP
    pub driver: Option<String>,
    /// Facing classification, `None` when it cannot be determined
    pub facing: Option<FacingMode>,
}

/// Pixel layout of a camera frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// BGRA - 32-bit with alpha (B G R A byte order)
    BGRA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    YUYV,
    /// UYVY - Packed 4:2:2 (U Y0 V Y1 interleaved)
    UYVY,
    /// NV12 - Semi-planar 4:2:0 (Y plane followed by interleaved UV plane)
    NV12,
}

impl PixelFormat {
    /// Parse format from GStreamer format string
    pub fn from_gst_format(format: &str) -> Option<Self> {
        match format {
            "RGBA" | "RGBx" => Some(Self::RGBA),
            "BGRA" | "BGRx" => Some(Self::BGRA),
            "RGB" => Some(Self::RGB24),
            "GRAY8" => Some(Self::Gray8),
            "YUY2" | "YUYV" => Some(Self::YUYV),
            "UYVY" => Some(Self::UYVY),
            "NV12" => Some(Self::NV12),
            _ => None,
        }
    }

    /// Minimum bytes per row for a frame of the given width
    pub fn min_stride(&self, width: u32) -> u32 {
        match self {
            Self::RGBA | Self::BGRA => width * 4,
            Self::RGB24 => width * 3,
            Self::YUYV | Self::UYVY => width * 2,
            Self::Gray8 | Self::NV12 => width,
        }
    }
}

/// A single frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Pixel data; NV12 frames carry the UV plane right after the Y plane
    pub data: Arc<[u8]>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride for the main data (bytes per row, may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            format: PixelFormat::RGBA,
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }
}

/// One video track of a [`MediaStream`]
///
/// Stopping a track releases the hardware behind it. `stop` must be
/// idempotent.
pub trait MediaTrack: Send {
    /// Human readable label (usually the device name)
    fn label(&self) -> &str;

    /// Stop producing frames and release the device
    fn stop(&mut self);

    /// Whether the track is still producing frames
    fn is_live(&self) -> bool;
}

/// A granted camera stream: its tracks plus the frames they produce
pub struct MediaStream {
    id: u64,
    tracks: Vec<Box<dyn MediaTrack>>,
    frames: FrameReceiver,
}

impl MediaStream {
    /// Create a stream from its tracks and the receiving end of their frames
    pub fn new(tracks: Vec<Box<dyn MediaTrack>>, frames: FrameReceiver) -> Self {
        Self {
            id: NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed),
            tracks,
            frames,
        }
    }

    /// Process-unique stream id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether any track is still live
    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(|t| t.is_live())
    }

    /// Label of the first track
    pub fn label(&self) -> Option<&str> {
        self.tracks.first().map(|t| t.label())
    }

    /// Non-blocking receive of the next pending frame
    pub fn try_next_frame(&mut self) -> Option<CameraFrame> {
        self.frames.try_recv().ok()
    }

    /// Stop every track of the stream, ended ones included
    pub fn stop_all_tracks(&mut self) {
        for track in &mut self.tracks {
            track.stop();
        }
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.stop_all_tracks();
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &self.tracks.len())
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingTrack {
        live: bool,
        stops: Arc<AtomicU64>,
    }

    impl MediaTrack for CountingTrack {
        fn label(&self) -> &str {
            "counting"
        }
        fn stop(&mut self) {
            self.live = false;
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
        fn is_live(&self) -> bool {
            self.live
        }
    }

    fn counting_stream(live: bool) -> (MediaStream, Arc<AtomicU64>) {
        let (_sender, receiver) = futures::channel::mpsc::channel(1);
        let stops = Arc::new(AtomicU64::new(0));
        let stream = MediaStream::new(
            vec![Box::new(CountingTrack {
                live,
                stops: Arc::clone(&stops),
            })],
            receiver,
        );
        (stream, stops)
    }

    #[test]
    fn test_stop_all_tracks_is_idempotent() {
        let (mut stream, _stops) = counting_stream(true);
        assert!(stream.is_active());
        assert_eq!(stream.label(), Some("counting"));

        stream.stop_all_tracks();
        stream.stop_all_tracks();
        assert!(!stream.is_active());
    }

    #[test]
    fn test_stop_all_tracks_releases_ended_tracks() {
        let (mut stream, stops) = counting_stream(false);
        assert!(!stream.is_active());

        stream.stop_all_tracks();
        assert!(stops.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_stream_ids_are_unique() {
        let (_a, ra) = futures::channel::mpsc::channel(1);
        let (_b, rb) = futures::channel::mpsc::channel(1);
        let first = MediaStream::new(Vec::new(), ra);
        let second = MediaStream::new(Vec::new(), rb);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_min_stride() {
        assert_eq!(PixelFormat::RGBA.min_stride(640), 2560);
        assert_eq!(PixelFormat::YUYV.min_stride(640), 1280);
        assert_eq!(PixelFormat::NV12.min_stride(640), 640);
    }

    #[test]
    fn test_facing_mode_serde() {
        assert_eq!(
            serde_json::to_string(&FacingMode::User).unwrap(),
            "\"user\""
        );
        let parsed: FacingMode = serde_json::from_str("\"environment\"").unwrap();
        assert_eq!(parsed, FacingMode::Environment);
    }
}
