// SPDX-License-Identifier: GPL-3.0-only

//! Photobooth - take a photo, leave a message, send it to the event screen
//!
//! The booth runs a three-step flow: a live camera view, a still preview with
//! an optional comment, and a thank-you screen once the photo was uploaded.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Flow state machine, message handling and task execution
//! - [`backends`]: Camera capability, device enumeration, file-backed camera
//! - [`media`]: Pixel format conversion
//! - [`pipelines`]: Still capture and JPEG encoding
//! - [`upload`]: Multipart upload to the photo endpoint
//! - [`config`]: User configuration handling
//! - [`terminal`]: Terminal user interface
//!
//! # Example
//!
//! ```ignore
//! // Run the booth in the terminal:
//! // photobooth --endpoint https://example.com/api/photos
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod i18n;
pub mod media;
pub mod pipelines;
pub mod terminal;
pub mod upload;

// Re-export commonly used types
pub use app::{BoothModel, BoothRuntime, FlowState, Message, Task};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use upload::{UploadClient, UploadReceipt, Uploader};
