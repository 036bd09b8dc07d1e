// SPDX-License-Identifier: GPL-3.0-only

//! Still image streamed as a camera
//!
//! The image is decoded once and re-sent at a steady rate until the track is
//! stopped, so the rest of the booth cannot tell it apart from a webcam.

use crate::backends::camera::types::*;
use crate::backends::camera::CameraSource;
use crate::constants::{file_formats, virtual_camera as vc_timing};
use crate::errors::CameraError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Load an image file as a tightly packed RGBA frame
pub fn load_image_as_frame(path: &Path) -> CameraResult<CameraFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    if !file_formats::is_image_extension(extension) {
        return Err(CameraError::Unsupported(format!(
            "Unsupported file format: {}",
            path.display()
        )));
    }

    info!(path = %path.display(), "Loading image file");
    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
            CameraError::NoCameraFound
        }
        image::ImageError::IoError(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
            CameraError::PermissionDenied
        }
        other => CameraError::InitializationFailed(format!(
            "Failed to load image '{}': {}",
            path.display(),
            other
        )),
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    info!(width, height, "Image loaded successfully");
    Ok(CameraFrame::from_rgba(width, height, rgba.into_raw()))
}

/// Camera source that streams a still image file
pub struct FileCameraSource {
    path: PathBuf,
}

impl FileCameraSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CameraSource for FileCameraSource {
    fn name(&self) -> &str {
        "file"
    }

    fn enumerate_cameras(&self) -> CameraResult<Vec<CameraDevice>> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }
        Ok(vec![CameraDevice {
            name: self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| self.path.display().to_string()),
            path: self.path.display().to_string(),
            driver: None,
            facing: Some(FacingMode::User),
        }])
    }

    fn acquire(&mut self, constraints: &StreamConstraints) -> CameraResult<MediaStream> {
        if constraints.audio {
            return Err(CameraError::Unsupported(
                "audio capture is not available".to_string(),
            ));
        }

        let frame = load_image_as_frame(&self.path)?;
        let (sender, receiver) =
            futures::channel::mpsc::channel(crate::constants::pipeline::FRAME_CHANNEL_CAPACITY);
        let track = FileVideoTrack::spawn(self.path.display().to_string(), frame, sender)?;
        Ok(MediaStream::new(vec![Box::new(track)], receiver))
    }
}

/// Track that re-sends one frame until stopped
pub struct FileVideoTrack {
    label: String,
    stop_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FileVideoTrack {
    fn spawn(label: String, frame: CameraFrame, mut sender: FrameSender) -> CameraResult<Self> {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_flag);

        let handle = std::thread::Builder::new()
            .name("file-camera".to_string())
            .spawn(move || {
                debug!("File camera streaming started");
                while !thread_stop.load(Ordering::Acquire) {
                    let mut next = frame.clone();
                    next.captured_at = Instant::now();
                    if let Err(e) = sender.try_send(next)
                        && e.is_disconnected()
                    {
                        break;
                    }
                    std::thread::sleep(vc_timing::IMAGE_STREAM_FRAME_DURATION);
                }
                debug!("File camera streaming stopped");
            })
            .map_err(|e| CameraError::InitializationFailed(e.to_string()))?;

        Ok(Self {
            label,
            stop_flag,
            handle: Some(handle),
        })
    }
}

impl MediaTrack for FileVideoTrack {
    fn label(&self) -> &str {
        &self.label
    }

    fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("File camera thread panicked");
        }
    }

    fn is_live(&self) -> bool {
        !self.stop_flag.load(Ordering::Acquire)
    }
}

impl Drop for FileVideoTrack {
    fn drop(&mut self) {
        self.stop();
    }
}
