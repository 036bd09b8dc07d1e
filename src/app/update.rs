// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` is a dispatcher; each message has a focused handler below.
//! Messages that do not apply to the current flow state are ignored.

use super::{BoothModel, InFlightUpload, Message, StatusMessage, Task, UploadJob};
use crate::app::state::FlowAction;
use crate::errors::AppError;
use crate::upload::{UploadReceipt, Uploader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

impl<U: Uploader> BoothModel<U> {
    /// Main message handler
    pub fn update(&mut self, message: Message) -> Task {
        match message {
            Message::Tick => {
                self.handle_tick();
                Task::none()
            }
            Message::TakePhoto => self.handle_take_photo(),
            Message::CommentChanged(text) => {
                self.edit_comment(|flow| flow.set_comment(text));
                Task::none()
            }
            Message::CommentInput(c) => {
                self.edit_comment(|flow| flow.push_comment_char(c));
                Task::none()
            }
            Message::CommentBackspace => {
                self.edit_comment(|flow| flow.pop_comment_char());
                Task::none()
            }
            Message::Send => self.handle_send(),
            Message::Retry => self.handle_retry(),
            Message::UploadFinished { generation, result } => {
                self.handle_upload_finished(generation, result)
            }
        }
    }

    fn handle_tick(&mut self) {
        if let Err(e) = self.camera.poll_frames() {
            warn!(error = %e, "Live view lost its camera");
            self.status = Some(StatusMessage::CameraUnavailable(e));
        }
    }

    fn handle_take_photo(&mut self) -> Task {
        if let Err(e) = self.flow.ensure(FlowAction::TakePhoto) {
            debug!(error = %e, "Ignoring take photo");
            return Task::none();
        }

        let was_streaming = self.camera.is_streaming();
        match self.capturer.capture(&mut self.camera) {
            Ok(capture) => {
                info!(
                    width = capture.width(),
                    height = capture.height(),
                    "Showing preview"
                );
                if let Err(e) = self.flow.show_preview(capture) {
                    error!(error = %e, "Flow rejected the capture");
                }
                self.status = None;
            }
            Err(e) => {
                warn!(error = %e, "Capture failed");
                self.status = Some(StatusMessage::CaptureFailed(e));
                // Encoding failed after this capture released the camera
                if was_streaming && !self.camera.is_streaming() {
                    let _ = self.start_camera();
                }
            }
        }
        Task::none()
    }

    fn edit_comment<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut super::Flow) -> Result<(), crate::errors::FlowError>,
    {
        if let Err(e) = edit(&mut self.flow) {
            debug!(error = %e, "Ignoring comment edit");
        }
    }

    fn handle_send(&mut self) -> Task {
        if let Err(e) = self.flow.ensure(FlowAction::Send) {
            debug!(error = %e, "Ignoring send");
            return Task::none();
        }
        if let Some(in_flight) = &self.in_flight {
            debug!(generation = in_flight.generation, "Upload already in flight");
            return Task::none();
        }
        let Some(capture) = self.flow.capture().cloned() else {
            error!("Previewing without a capture");
            return Task::none();
        };

        let generation = self.next_generation;
        self.next_generation += 1;
        let cancel = CancellationToken::new();
        self.in_flight = Some(InFlightUpload {
            generation,
            cancel: cancel.clone(),
        });
        self.status = Some(StatusMessage::Sending);

        info!(
            generation,
            comment_len = self.flow.comment().len(),
            "Submitting photo"
        );
        Task::Upload(UploadJob {
            generation,
            capture,
            comment: self.flow.comment().to_string(),
            cancel,
        })
    }

    fn handle_retry(&mut self) -> Task {
        if let Err(e) = self.flow.reset() {
            debug!(error = %e, "Ignoring retry");
            return Task::none();
        }

        if let Some(in_flight) = self.in_flight.take() {
            info!(generation = in_flight.generation, "Cancelling in-flight upload");
            in_flight.cancel.cancel();
        }
        self.status = None;

        info!("Discarded capture, restarting camera");
        let _ = self.start_camera();
        Task::none()
    }

    fn handle_upload_finished(
        &mut self,
        generation: u64,
        result: Result<UploadReceipt, AppError>,
    ) -> Task {
        match &self.in_flight {
            Some(in_flight) if in_flight.generation == generation => {}
            _ => {
                debug!(generation, "Ignoring stale upload completion");
                return Task::none();
            }
        }
        self.in_flight = None;

        match result {
            Ok(receipt) => {
                info!(status = receipt.status, bytes = receipt.bytes, "Submission complete");
                if let Err(e) = self.flow.mark_submitted() {
                    error!(error = %e, "Flow rejected the upload completion");
                }
                self.status = None;
            }
            Err(e) => {
                warn!(error = %e, "Submission failed, staying on preview");
                self.status = Some(StatusMessage::SendFailed(e.to_string()));
            }
        }
        Task::none()
    }
}
