// SPDX-License-Identifier: GPL-3.0-only

//! Camera discovery
//!
//! Scans V4L2 capture nodes and classifies which way each one faces. When no
//! node can be used directly, a PipeWire default camera is offered instead
//! (empty path = PipeWire auto-selects).

use super::types::{CameraDevice, CameraResult, FacingMode};
use crate::errors::CameraError;
use std::io::ErrorKind;
use tracing::{debug, info, warn};
use v4l::capability::Flags;

/// Name of the PipeWire fallback device
pub const PIPEWIRE_DEFAULT_NAME: &str = "Default Camera (PipeWire)";

/// Enumerate every camera that can deliver video frames
///
/// Returns `PermissionDenied` when capture nodes exist but none could be
/// opened because access was refused.
pub fn enumerate_cameras() -> CameraResult<Vec<CameraDevice>> {
    let mut cameras = Vec::new();
    let mut denied = 0usize;
    let mut nodes = v4l::context::enum_devices();
    nodes.sort_by_key(|node| node.index());

    for node in &nodes {
        let path = node.path().to_string_lossy().to_string();
        let device = match v4l::Device::with_path(&path) {
            Ok(device) => device,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                warn!(path = %path, "Permission denied opening camera node");
                denied += 1;
                continue;
            }
            Err(e) => {
                debug!(path = %path, error = %e, "Skipping unreadable video node");
                continue;
            }
        };

        let caps = match device.query_caps() {
            Ok(caps) => caps,
            Err(e) => {
                debug!(path = %path, error = %e, "QUERYCAP failed");
                continue;
            }
        };

        // Metadata and output nodes share the /dev/video* namespace
        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            debug!(path = %path, card = %caps.card, "Not a capture node");
            continue;
        }

        let sysfs_name = node.name();
        let name = if caps.card.is_empty() {
            sysfs_name.clone().unwrap_or_else(|| path.clone())
        } else {
            caps.card.clone()
        };
        let facing = classify_facing(&name).or_else(|| sysfs_name.as_deref().and_then(classify_facing));

        debug!(path = %path, name = %name, driver = %caps.driver, ?facing, "Found capture device");
        cameras.push(CameraDevice {
            name,
            path,
            driver: Some(caps.driver),
            facing,
        });
    }

    if !cameras.is_empty() {
        info!(count = cameras.len(), "Enumerated V4L2 cameras");
        return Ok(cameras);
    }

    if denied > 0 {
        return Err(CameraError::PermissionDenied);
    }

    if pipewire_available() {
        info!("No V4L2 camera usable, using PipeWire auto-selection");
        return Ok(vec![CameraDevice {
            name: PIPEWIRE_DEFAULT_NAME.to_string(),
            path: String::new(),
            driver: None,
            facing: None,
        }]);
    }

    Ok(cameras)
}

/// Guess which way a camera faces from its name
///
/// Laptop and USB webcams face the user; phone sensors carry front/back in
/// their names.
pub fn classify_facing(name: &str) -> Option<FacingMode> {
    let lower = name.to_lowercase();
    const USER_HINTS: &[&str] = &["front", "user", "integrated", "webcam", "facetime", "selfie"];
    const ENVIRONMENT_HINTS: &[&str] = &["back", "rear", "world", "environment"];

    if ENVIRONMENT_HINTS.iter().any(|hint| lower.contains(hint)) {
        Some(FacingMode::Environment)
    } else if USER_HINTS.iter().any(|hint| lower.contains(hint)) {
        Some(FacingMode::User)
    } else {
        None
    }
}

fn pipewire_available() -> bool {
    if gstreamer::init().is_err() {
        warn!("GStreamer init failed");
        return false;
    }
    gstreamer::ElementFactory::find("pipewiresrc").is_some()
}
