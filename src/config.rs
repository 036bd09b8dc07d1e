// SPDX-License-Identifier: GPL-3.0-only

//! Booth configuration
//!
//! Stored as JSON under the user config dir. Every field has a default, so a
//! missing file or a file with only some keys is valid.

use crate::backends::camera::{CameraSourceKind, FacingMode, StreamConstraints};
use crate::constants::{paths, timing, upload};
use crate::errors::ConfigError;
use crate::pipelines::photo::EncodingQuality;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Endpoint receiving the multipart upload
    pub upload_url: String,
    /// Whole-request timeout for an upload
    pub upload_timeout_secs: u64,
    /// Which camera to open
    pub camera_source: CameraSourceKind,
    /// Preferred camera direction
    pub facing_mode: FacingMode,
    /// JPEG quality for preview and upload
    pub jpeg_quality: EncodingQuality,
    /// Mirror the live view horizontally (selfie mode); captures are never mirrored
    pub mirror_preview: bool,
    /// Auto exposure settling time before one-shot captures
    pub warmup_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_url: upload::DEFAULT_UPLOAD_URL.to_string(),
            upload_timeout_secs: upload::DEFAULT_TIMEOUT_SECS,
            camera_source: CameraSourceKind::Auto,
            facing_mode: FacingMode::User,
            jpeg_quality: EncodingQuality::High,
            mirror_preview: true,
            warmup_ms: timing::DEFAULT_WARMUP_MS,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(paths::APP_DIR).join(paths::CONFIG_FILE))
    }

    /// Load a config file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Apply command line overrides
    pub fn with_overrides(
        mut self,
        upload_url: Option<String>,
        camera_source: Option<CameraSourceKind>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = upload_url {
            self.upload_url = url;
        }
        if let Some(source) = camera_source {
            self.camera_source = source;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values that cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload_url.trim().is_empty() {
            return Err(ConfigError::Invalid("upload_url is empty".to_string()));
        }
        if self.upload_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "upload_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    /// Video only, preferring the configured facing mode
    pub fn stream_constraints(&self) -> StreamConstraints {
        StreamConstraints {
            facing_mode: self.facing_mode,
            audio: false,
        }
    }
}
