// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Upload endpoint and multipart layout
pub mod upload {
    /// Backend that displays submitted photos on the event screen
    pub const DEFAULT_UPLOAD_URL: &str = "https://backend-fv.onrender.com/api/photos";

    /// Multipart field carrying the JPEG
    pub const IMAGE_FIELD: &str = "image";

    /// Multipart field carrying the comment text
    pub const COMMENT_FIELD: &str = "comment";

    /// File name attached to the image part
    pub const IMAGE_FILE_NAME: &str = "captured.jpg";

    /// MIME type of the image part
    pub const IMAGE_MIME: &str = "image/jpeg";

    /// Request timeout when none is configured
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
}

/// GStreamer pipeline constants
pub mod pipeline {
    /// Maximum buffer queue size (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Output pixel format for appsink
    pub const OUTPUT_FORMAT: &str = "RGBA";

    /// Frames buffered between the capture thread and the UI
    pub const FRAME_CHANNEL_CAPACITY: usize = 4;
}

/// Timing constants
pub mod timing {
    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Time to let auto exposure settle before a one-shot capture
    pub const DEFAULT_WARMUP_MS: u64 = 500;

    /// Give up waiting for the first frame of a one-shot capture
    pub const FIRST_FRAME_TIMEOUT_SECS: u64 = 5;

    /// Terminal input poll interval (~60 redraws per second)
    pub const UI_POLL_INTERVAL_MS: u64 = 16;
}

/// Supported file formats for the file camera source
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// File camera source timing
pub mod virtual_camera {
    use super::Duration;

    /// Frame rate for image streaming (~30fps)
    pub const IMAGE_STREAM_FRAME_DURATION: Duration = Duration::from_millis(33);
}

/// On-disk locations
pub mod paths {
    /// Directory name under the XDG config/cache dirs
    pub const APP_DIR: &str = "photobooth";

    /// Config file name
    pub const CONFIG_FILE: &str = "config.json";

    /// Log file used while the terminal UI owns the screen
    pub const LOG_FILE: &str = "photobooth.log";

    /// Folder under the pictures directory for locally saved captures
    pub const SAVE_FOLDER: &str = "Photobooth";
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }

    /// User agent sent with uploads
    pub fn user_agent() -> String {
        format!("photobooth/{}", version())
    }
}
