// SPDX-License-Identifier: GPL-3.0-only

//! Camera controller
//!
//! The controller provides:
//! - Stream lifecycle (acquire on start, release on stop)
//! - The live surface: the bound stream and the newest frame it produced
//!
//! At most one stream is bound at any time. Only the controller acquires or
//! releases it.

use super::types::*;
use super::CameraSource;
use crate::errors::CameraError;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The live video surface
///
/// Mirrors a `<video>` element: it is either bound to a stream or empty, and
/// reports the native size of the frame it currently shows.
#[derive(Debug, Default)]
pub struct LiveSurface {
    stream: Option<MediaStream>,
    current_frame: Option<Arc<CameraFrame>>,
}

impl LiveSurface {
    /// Whether a stream is bound
    pub fn is_bound(&self) -> bool {
        self.stream.is_some()
    }

    /// Id of the bound stream
    pub fn stream_id(&self) -> Option<u64> {
        self.stream.as_ref().map(MediaStream::id)
    }

    /// The frame currently shown
    pub fn current_frame(&self) -> Option<&Arc<CameraFrame>> {
        self.current_frame.as_ref()
    }

    /// Native width of the shown frame (0 before the first frame)
    pub fn video_width(&self) -> u32 {
        self.current_frame.as_ref().map_or(0, |f| f.width)
    }

    /// Native height of the shown frame (0 before the first frame)
    pub fn video_height(&self) -> u32 {
        self.current_frame.as_ref().map_or(0, |f| f.height)
    }
}

/// Acquires and releases the camera stream behind the live surface
pub struct CameraController {
    source: Box<dyn CameraSource>,
    constraints: StreamConstraints,
    surface: LiveSurface,
    acquisitions: u64,
}

impl CameraController {
    /// Create a controller for a camera source
    ///
    /// Nothing is acquired until [`start`](Self::start) is called.
    pub fn new(source: Box<dyn CameraSource>, constraints: StreamConstraints) -> Self {
        info!(source = source.name(), facing = %constraints.facing_mode, "Creating camera controller");
        Self {
            source,
            constraints,
            surface: LiveSurface::default(),
            acquisitions: 0,
        }
    }

    /// Request a stream and bind it to the live surface
    ///
    /// A previously bound stream is released first. On failure the surface
    /// stays unbound.
    pub fn start(&mut self) -> CameraResult<()> {
        if self.surface.is_bound() {
            debug!("Releasing bound stream before restarting");
            self.stop();
        }

        self.acquisitions += 1;
        info!(
            source = self.source.name(),
            attempt = self.acquisitions,
            "Requesting camera stream"
        );

        match self.source.acquire(&self.constraints) {
            Ok(stream) => {
                info!(
                    stream = stream.id(),
                    label = stream.label().unwrap_or("unknown"),
                    "Camera stream bound to live surface"
                );
                self.surface.stream = Some(stream);
                self.surface.current_frame = None;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Error accessing the camera");
                Err(e)
            }
        }
    }

    /// Stop every track of the bound stream and unbind it
    ///
    /// No-op when nothing is bound.
    pub fn stop(&mut self) {
        let Some(stream) = self.surface.stream.take() else {
            return;
        };
        info!(stream = stream.id(), "Stopping camera stream");
        self.surface.current_frame = None;
        self.source.release(stream);
    }

    /// Drain pending frames so the surface shows the newest one
    ///
    /// Returns the number of frames received. A bound stream whose tracks
    /// have all ended is released and the surface is cleared, so a stale
    /// frame can never be captured; that is reported once as
    /// [`CameraError::StreamEnded`].
    pub fn poll_frames(&mut self) -> CameraResult<usize> {
        let Some(stream) = self.surface.stream.as_mut() else {
            return Ok(0);
        };

        let mut received = 0;
        while let Some(frame) = stream.try_next_frame() {
            self.surface.current_frame = Some(Arc::new(frame));
            received += 1;
        }

        if !stream.is_active() {
            warn!(stream = stream.id(), "Camera stream ended, clearing live surface");
            self.stop();
            return Err(CameraError::StreamEnded);
        }
        Ok(received)
    }

    /// The live surface
    pub fn surface(&self) -> &LiveSurface {
        &self.surface
    }

    /// Whether a stream is bound
    pub fn is_streaming(&self) -> bool {
        self.surface.is_bound()
    }

    /// Number of acquisition requests issued so far
    pub fn acquisition_count(&self) -> u64 {
        self.acquisitions
    }

}

impl Drop for CameraController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CameraController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraController")
            .field("source", &self.source.name())
            .field("streaming", &self.is_streaming())
            .field("acquisitions", &self.acquisitions)
            .finish()
    }
}
