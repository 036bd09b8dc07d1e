// SPDX-License-Identifier: GPL-3.0-only

//! File-backed camera
//!
//! Streams a still image through the same [`CameraSource`] interface the
//! real camera uses. Handy for kiosks without a webcam and for demos.
//!
//! [`CameraSource`]: crate::backends::camera::CameraSource

mod file_source;

pub use file_source::{FileCameraSource, FileVideoTrack, load_image_as_frame};
