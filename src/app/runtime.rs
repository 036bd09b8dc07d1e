// SPDX-License-Identifier: GPL-3.0-only

//! Task execution
//!
//! Uploads run on the tokio runtime and report back as
//! [`Message::UploadFinished`], tagged with the generation they were started
//! with. Retrying cancels the token of the pending upload.

use super::{BoothModel, Message, Task, UploadJob};
use crate::errors::{AppError, UploadError};
use crate::upload::Uploader;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::debug;

/// Encode the capture and submit it, unless cancelled first
pub async fn run_upload<U: Uploader>(uploader: Arc<U>, job: UploadJob) -> Message {
    let UploadJob {
        generation,
        capture,
        comment,
        cancel,
    } = job;

    let work = async {
        let blob = capture.to_jpeg_blob().await?;
        let receipt = uploader.submit(blob, comment).await?;
        Ok::<_, AppError>(receipt)
    };

    let result = tokio::select! {
        _ = cancel.cancelled() => {
            debug!(generation, "Upload cancelled");
            Err(AppError::Upload(UploadError::Cancelled))
        }
        result = work => result,
    };

    Message::UploadFinished { generation, result }
}

/// A model wired to a tokio runtime
///
/// Messages go in through [`send`](Self::send); completed tasks come back
/// through [`pump`](Self::pump) or [`process_next`](Self::process_next).
pub struct BoothRuntime<U: Uploader> {
    model: BoothModel<U>,
    handle: Handle,
    sender: UnboundedSender<Message>,
    receiver: UnboundedReceiver<Message>,
}

impl<U: Uploader> BoothRuntime<U> {
    pub fn new(model: BoothModel<U>, handle: Handle) -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            model,
            handle,
            sender,
            receiver,
        }
    }

    pub fn model(&self) -> &BoothModel<U> {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut BoothModel<U> {
        &mut self.model
    }

    /// Apply a message and start whatever task it produced
    pub fn send(&mut self, message: Message) {
        let task = self.model.update(message);
        self.dispatch(task);
    }

    /// Apply every completed task without waiting
    ///
    /// Returns the number of messages applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.receiver.try_recv() {
            self.send(message);
            applied += 1;
        }
        applied
    }

    /// Wait for the next completed task and apply it
    pub async fn process_next(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(message) => {
                self.send(message);
                true
            }
            None => false,
        }
    }

    fn dispatch(&self, task: Task) {
        match task {
            Task::None => {}
            Task::Upload(job) => {
                let uploader = Arc::clone(self.model.uploader());
                let sender = self.sender.clone();
                self.handle.spawn(async move {
                    let message = run_upload(uploader, job).await;
                    if sender.send(message).is_err() {
                        debug!("Booth closed before the upload finished");
                    }
                });
            }
        }
    }
}
