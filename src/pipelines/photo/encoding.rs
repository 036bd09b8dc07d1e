// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding of captured rasters
//!
//! Produces the two artifacts a capture needs: a base64 data URL for the
//! on-screen preview and a binary blob for upload or saving.

use crate::errors::PhotoError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

/// An encoded JPEG
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegBlob {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl JpegBlob {
    /// `data:image/jpeg;base64,...` form of the blob
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            crate::constants::upload::IMAGE_MIME,
            STANDARD.encode(&self.data)
        )
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Photo encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoEncoder {
    quality: EncodingQuality,
}

impl PhotoEncoder {
    pub fn new(quality: EncodingQuality) -> Self {
        Self { quality }
    }

    pub fn quality(&self) -> EncodingQuality {
        self.quality
    }

    /// Encode a raster as JPEG on the calling thread
    ///
    /// JPEG has no alpha channel, so it is dropped.
    pub fn encode_jpeg(&self, image: &RgbaImage) -> Result<JpegBlob, PhotoError> {
        let rgb = image::DynamicImage::ImageRgba8(image.clone()).into_rgb8();

        let mut buffer = Vec::new();
        {
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut buffer,
                self.quality.jpeg_quality(),
            );
            encoder
                .encode(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| PhotoError::EncodingFailed(e.to_string()))?;
        }

        debug!(
            width = rgb.width(),
            height = rgb.height(),
            size = buffer.len(),
            quality = self.quality.jpeg_quality(),
            "JPEG encoding complete"
        );

        Ok(JpegBlob {
            data: buffer,
            width: rgb.width(),
            height: rgb.height(),
        })
    }

    /// Encode a raster as JPEG in a blocking task
    pub async fn encode_blob(&self, image: Arc<RgbaImage>) -> Result<JpegBlob, PhotoError> {
        let encoder = *self;
        tokio::task::spawn_blocking(move || encoder.encode_jpeg(&image))
            .await
            .map_err(|e| PhotoError::EncodingFailed(format!("Encoding task error: {}", e)))?
    }

    /// Write a blob to `output_dir` under a timestamped name
    pub async fn save(&self, blob: &JpegBlob, output_dir: &Path) -> Result<PathBuf, PhotoError> {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let filepath = output_dir.join(format!("IMG_{}.jpg", timestamp));
        info!(path = %filepath.display(), "Saving photo");

        let data = blob.data.clone();
        let dir = output_dir.to_path_buf();
        let target = filepath.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&dir)?;
            std::fs::write(&target, &data)
        })
        .await
        .map_err(|e| PhotoError::SaveFailed(format!("Save task error: {}", e)))??;

        info!(path = %filepath.display(), "Photo saved successfully");
        Ok(filepath)
    }
}
