// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the booth
//!
//! Every operation of the capture flow returns one of these instead of only
//! logging, so the view can decide how to react.

use crate::app::state::{FlowAction, FlowState};
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera acquisition errors
    Camera(CameraError),
    /// Frame capture and encoding errors
    Photo(PhotoError),
    /// Upload errors
    Upload(UploadError),
    /// Configuration errors
    Config(ConfigError),
    /// Action not allowed in the current flow state
    Flow(FlowError),
    /// Generic error with message
    Other(String),
}

/// Camera acquisition errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// The user or the system refused access to the camera
    PermissionDenied,
    /// No camera devices found
    NoCameraFound,
    /// The stream could not be started
    InitializationFailed(String),
    /// The requested constraints cannot be satisfied (e.g. audio)
    Unsupported(String),
    /// Backend error (e.g. GStreamer)
    Backend(String),
    /// A bound stream stopped delivering frames (unplugged, pipeline error)
    StreamEnded,
}

/// Frame capture errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoError {
    /// No stream is bound to the live surface
    NoVideoSurface,
    /// A stream is bound but has not produced a frame yet
    NoFrameAvailable,
    /// The frame's pixel layout cannot be copied into a raster buffer
    UnsupportedFormat(String),
    /// JPEG encoding failed
    EncodingFailed(String),
    /// Writing an encoded photo to disk failed
    SaveFailed(String),
}

/// Upload errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The configured endpoint is not a valid URL
    InvalidEndpoint(String),
    /// The HTTP client could not be built
    Client(String),
    /// Connection to the endpoint failed
    Connect(String),
    /// The request did not finish within the configured timeout
    Timeout,
    /// Any other transport error
    Network(String),
    /// The upload was abandoned because the flow was restarted
    Cancelled,
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Reading or writing the config file failed
    Io(String),
    /// The config file is not valid JSON for [`crate::Config`]
    Parse(String),
    /// A value is present but unusable
    Invalid(String),
}

/// Rejected flow transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowError {
    pub state: FlowState,
    pub action: FlowAction,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Photo(e) => write!(f, "Photo error: {}", e),
            AppError::Upload(e) => write!(f, "Upload error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Flow(e) => write!(f, "{}", e),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied => write!(f, "Permission to use the camera was denied"),
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            CameraError::Unsupported(msg) => write!(f, "Unsupported request: {}", msg),
            CameraError::Backend(msg) => write!(f, "Backend error: {}", msg),
            CameraError::StreamEnded => write!(f, "The camera stopped sending video"),
        }
    }
}

impl fmt::Display for PhotoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoError::NoVideoSurface => write!(f, "No live video to capture from"),
            PhotoError::NoFrameAvailable => write!(f, "No frame available for capture"),
            PhotoError::UnsupportedFormat(msg) => write!(f, "Unsupported frame format: {}", msg),
            PhotoError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            PhotoError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::InvalidEndpoint(msg) => write!(f, "Invalid upload endpoint: {}", msg),
            UploadError::Client(msg) => write!(f, "HTTP client error: {}", msg),
            UploadError::Connect(msg) => write!(f, "Connection failed: {}", msg),
            UploadError::Timeout => write!(f, "Request timed out"),
            UploadError::Network(msg) => write!(f, "Network error: {}", msg),
            UploadError::Cancelled => write!(f, "Upload cancelled"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid value: {}", msg),
        }
    }
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cannot {} while {}", self.action, self.state)
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for PhotoError {}
impl std::error::Error for UploadError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for FlowError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        AppError::Photo(err)
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        AppError::Upload(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<FlowError> for AppError {
    fn from(err: FlowError) -> Self {
        AppError::Flow(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::SaveFailed(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<image::ImageError> for PhotoError {
    fn from(err: image::ImageError) -> Self {
        PhotoError::EncodingFailed(err.to_string())
    }
}
