// SPDX-License-Identifier: GPL-3.0-only

//! Real camera source backed by GStreamer

mod pipeline;

pub use pipeline::{CapturePipeline, classify_error, pipeline_description};

use super::types::*;
use super::{CameraSource, enumeration, select_device};
use crate::constants::pipeline::FRAME_CHANNEL_CAPACITY;
use crate::errors::CameraError;
use tracing::{debug, info};

/// Camera source that opens V4L2 devices (or the PipeWire default camera)
pub struct GstCameraSource {
    /// Fixed device path; `None` picks one by facing mode
    device_path: Option<String>,
}

impl GstCameraSource {
    pub fn new(device_path: Option<String>) -> Self {
        Self { device_path }
    }

    fn resolve_device(&self, constraints: &StreamConstraints) -> CameraResult<CameraDevice> {
        let cameras = enumeration::enumerate_cameras()?;

        if let Some(path) = &self.device_path {
            return Ok(cameras
                .into_iter()
                .find(|c| &c.path == path)
                .unwrap_or_else(|| {
                    debug!(path = %path, "Device not enumerated, opening it anyway");
                    CameraDevice {
                        name: path.clone(),
                        path: path.clone(),
                        driver: None,
                        facing: None,
                    }
                }));
        }

        select_device(&cameras, constraints.facing_mode)
            .cloned()
            .ok_or(CameraError::NoCameraFound)
    }
}

impl CameraSource for GstCameraSource {
    fn name(&self) -> &str {
        "gstreamer"
    }

    fn enumerate_cameras(&self) -> CameraResult<Vec<CameraDevice>> {
        enumeration::enumerate_cameras()
    }

    fn acquire(&mut self, constraints: &StreamConstraints) -> CameraResult<MediaStream> {
        if constraints.audio {
            return Err(CameraError::Unsupported(
                "audio capture is not available".to_string(),
            ));
        }

        let device = self.resolve_device(constraints)?;
        info!(device = %device.name, path = %device.path, facing = %constraints.facing_mode, "Opening camera");

        let (sender, receiver) = futures::channel::mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let pipeline = CapturePipeline::start(&device, sender)?;
        let track = GstVideoTrack {
            label: device.name,
            pipeline,
        };
        Ok(MediaStream::new(vec![Box::new(track)], receiver))
    }
}

/// Video track backed by a running capture pipeline
pub struct GstVideoTrack {
    label: String,
    pipeline: CapturePipeline,
}

impl MediaTrack for GstVideoTrack {
    fn label(&self) -> &str {
        &self.label
    }

    fn stop(&mut self) {
        self.pipeline.stop();
    }

    fn is_live(&self) -> bool {
        self.pipeline.is_running()
    }
}
