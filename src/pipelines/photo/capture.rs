// SPDX-License-Identifier: GPL-3.0-only

//! Still capture from the live surface

use super::encoding::{EncodingQuality, JpegBlob, PhotoEncoder};
use crate::backends::camera::CameraController;
use crate::errors::PhotoError;
use crate::media::frame_to_rgba;
use image::RgbaImage;
use std::sync::Arc;
use tracing::{debug, info};

/// A frame taken from the live surface
///
/// Holds the raster at the video's native size and the preview data URL
/// encoded from it. The upload blob is produced on demand.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    raster: Arc<RgbaImage>,
    preview_data_url: String,
    encoder: PhotoEncoder,
    captured_at: chrono::DateTime<chrono::Local>,
}

impl CapturedFrame {
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn raster(&self) -> &Arc<RgbaImage> {
        &self.raster
    }

    /// JPEG data URL shown as the preview
    pub fn preview_data_url(&self) -> &str {
        &self.preview_data_url
    }

    pub fn quality(&self) -> EncodingQuality {
        self.encoder.quality()
    }

    pub fn captured_at(&self) -> chrono::DateTime<chrono::Local> {
        self.captured_at
    }

    /// Encode the raster as a binary JPEG for upload
    pub async fn to_jpeg_blob(&self) -> Result<JpegBlob, PhotoError> {
        self.encoder.encode_blob(Arc::clone(&self.raster)).await
    }
}

/// Copies the current frame of the live surface into a raster
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCapturer {
    encoder: PhotoEncoder,
}

impl FrameCapturer {
    pub fn new(quality: EncodingQuality) -> Self {
        Self {
            encoder: PhotoEncoder::new(quality),
        }
    }

    /// Capture the frame currently shown and stop the camera
    ///
    /// Uses the frame already on the surface; pending frames are not drained.
    /// Fails without touching the camera when nothing can be copied. Once the
    /// raster is filled the camera is stopped before anything is encoded.
    pub fn capture(&self, camera: &mut CameraController) -> Result<CapturedFrame, PhotoError> {
        let surface = camera.surface();
        if !surface.is_bound() {
            debug!("Capture requested without a bound stream");
            return Err(PhotoError::NoVideoSurface);
        }
        let frame = surface
            .current_frame()
            .cloned()
            .ok_or(PhotoError::NoFrameAvailable)?;

        let raster = Arc::new(frame_to_rgba(&frame)?);
        drop(frame);
        camera.stop();

        let preview = self.encoder.encode_jpeg(&raster)?;
        info!(
            width = raster.width(),
            height = raster.height(),
            preview_bytes = preview.len(),
            "Captured frame"
        );

        Ok(CapturedFrame {
            raster,
            preview_data_url: preview.to_data_url(),
            encoder: self.encoder,
            captured_at: chrono::Local::now(),
        })
    }
}
