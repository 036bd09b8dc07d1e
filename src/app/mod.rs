// SPDX-License-Identifier: GPL-3.0-only

//! Booth application model
//!
//! [`BoothModel`] owns the camera controller, the frame capturer and the
//! capture flow. Views feed it [`Message`]s through
//! [`update`](BoothModel::update); long-running work comes back out as a
//! [`Task`] that [`runtime`] executes and answers with another message.

pub mod runtime;
pub mod state;
mod update;

pub use runtime::{BoothRuntime, run_upload};
pub use state::{Flow, FlowAction, FlowState};

use crate::backends::camera::CameraController;
use crate::config::Config;
use crate::errors::{AppError, CameraError, PhotoError};
use crate::pipelines::photo::{CapturedFrame, FrameCapturer};
use crate::upload::{UploadReceipt, Uploader};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Input to [`BoothModel::update`]
#[derive(Debug, Clone)]
pub enum Message {
    /// Pull pending camera frames onto the live surface
    Tick,
    TakePhoto,
    /// Replace the comment text
    CommentChanged(String),
    CommentInput(char),
    CommentBackspace,
    Send,
    /// Discard the capture and go back to the live camera
    Retry,
    /// An upload started with `generation` settled
    UploadFinished {
        generation: u64,
        result: Result<UploadReceipt, AppError>,
    },
}

/// Work requested by the model
#[must_use]
#[derive(Debug)]
pub enum Task {
    None,
    Upload(UploadJob),
}

impl Task {
    pub fn none() -> Self {
        Task::None
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Task::None)
    }
}

/// One submission attempt
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub generation: u64,
    pub capture: CapturedFrame,
    pub comment: String,
    pub cancel: CancellationToken,
}

#[derive(Debug)]
struct InFlightUpload {
    generation: u64,
    cancel: CancellationToken,
}

/// Last notable outcome, shown in the status line
#[derive(Debug, Clone, PartialEq)]
pub enum StatusMessage {
    CameraUnavailable(CameraError),
    CaptureFailed(PhotoError),
    Sending,
    SendFailed(String),
}

pub struct BoothModel<U: Uploader> {
    config: Config,
    camera: CameraController,
    capturer: FrameCapturer,
    uploader: Arc<U>,
    flow: Flow,
    in_flight: Option<InFlightUpload>,
    next_generation: u64,
    status: Option<StatusMessage>,
}

impl<U: Uploader> BoothModel<U> {
    pub fn new(config: Config, camera: CameraController, uploader: U) -> Self {
        let capturer = FrameCapturer::new(config.jpeg_quality);
        Self {
            config,
            camera,
            capturer,
            uploader: Arc::new(uploader),
            flow: Flow::new(),
            in_flight: None,
            next_generation: 1,
            status: None,
        }
    }

    /// Start the camera for the initial Capturing view
    ///
    /// On failure the flow stays in Capturing with no bound stream.
    pub fn mount(&mut self) -> Result<(), AppError> {
        info!(source = %self.config.camera_source, "Mounting booth");
        self.start_camera()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub fn state(&self) -> FlowState {
        self.flow.state()
    }

    pub fn uploader(&self) -> &Arc<U> {
        &self.uploader
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Whether a submission is waiting for its response
    pub fn is_uploading(&self) -> bool {
        self.in_flight.is_some()
    }

    fn start_camera(&mut self) -> Result<(), AppError> {
        match self.camera.start() {
            Ok(()) => {
                if matches!(self.status, Some(StatusMessage::CameraUnavailable(_))) {
                    self.status = None;
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Camera unavailable, live view stays empty");
                self.status = Some(StatusMessage::CameraUnavailable(e.clone()));
                Err(e.into())
            }
        }
    }
}
