// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture
//!
//! # Modules
//!
//! - [`camera`]: Camera capability, device enumeration and the GStreamer source
//! - [`virtual_camera`]: A still image presented as a camera

pub mod camera;
pub mod virtual_camera;
