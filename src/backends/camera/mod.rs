// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! Camera access is an injectable capability rather than a global: the
//! [`CameraController`] talks to a boxed [`CameraSource`], so tests and the
//! file-backed source plug in the same way the real camera does.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   BoothModel (app)  │
//! └──────────┬──────────┘
//!            │ start() / stop()
//!            ▼
//! ┌─────────────────────┐
//! │  CameraController   │  ← owns the single MediaStream + live surface
//! └──────────┬──────────┘
//!            │ acquire() / release()
//!            ▼
//! ┌─────────────────────┐
//! │  CameraSource trait │
//! └──────────┬──────────┘
//!       ┌────┴─────┐
//!       ▼          ▼
//!  GStreamer   File image
//! ```

pub mod controller;
pub mod enumeration;
pub mod gst_source;
pub mod types;

pub use controller::{CameraController, LiveSurface};
pub use types::*;

use crate::backends::virtual_camera::FileCameraSource;
use crate::errors::CameraError;
use std::path::PathBuf;
use std::str::FromStr;

/// Platform camera capability
///
/// `acquire` corresponds to a permission request: it either grants a
/// [`MediaStream`] or fails with a [`CameraError`].
pub trait CameraSource: Send {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Enumerate cameras this source can open
    fn enumerate_cameras(&self) -> CameraResult<Vec<CameraDevice>>;

    /// Request a video stream matching the constraints
    fn acquire(&mut self, constraints: &StreamConstraints) -> CameraResult<MediaStream>;

    /// Release a stream previously returned by `acquire`
    fn release(&mut self, mut stream: MediaStream) {
        stream.stop_all_tracks();
    }
}

/// Which camera source to open
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CameraSourceKind {
    /// Best V4L2 device for the facing mode, PipeWire default camera otherwise
    #[default]
    Auto,
    /// A specific V4L2 device path
    Device(String),
    /// A still image streamed as if it were a camera
    File(PathBuf),
}

impl FromStr for CameraSourceKind {
    type Err = CameraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        if let Some(path) = s.strip_prefix("file:") {
            if path.is_empty() {
                return Err(CameraError::Unsupported(
                    "file source needs a path".to_string(),
                ));
            }
            return Ok(Self::File(PathBuf::from(path)));
        }
        if s.starts_with('/') {
            return Ok(Self::Device(s.to_string()));
        }
        Err(CameraError::Unsupported(format!(
            "unknown camera source '{}' (expected auto, /dev/videoN or file:PATH)",
            s
        )))
    }
}

impl TryFrom<String> for CameraSourceKind {
    type Error = CameraError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CameraSourceKind> for String {
    fn from(kind: CameraSourceKind) -> Self {
        kind.to_string()
    }
}

impl std::fmt::Display for CameraSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraSourceKind::Auto => write!(f, "auto"),
            CameraSourceKind::Device(path) => write!(f, "{}", path),
            CameraSourceKind::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

/// Open the camera source described by `kind`
pub fn open_source(kind: &CameraSourceKind) -> Box<dyn CameraSource> {
    match kind {
        CameraSourceKind::Auto => Box::new(gst_source::GstCameraSource::new(None)),
        CameraSourceKind::Device(path) => {
            Box::new(gst_source::GstCameraSource::new(Some(path.clone())))
        }
        CameraSourceKind::File(path) => Box::new(FileCameraSource::new(path.clone())),
    }
}

/// Pick the device that best satisfies the facing mode
///
/// Exact facing matches win, then devices with unknown facing, then the rest,
/// keeping enumeration order within each group.
pub fn select_device(devices: &[CameraDevice], facing: FacingMode) -> Option<&CameraDevice> {
    devices
        .iter()
        .find(|d| d.facing == Some(facing))
        .or_else(|| devices.iter().find(|d| d.facing.is_none()))
        .or_else(|| devices.first())
}
