// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines
//!
//! - [`photo`]: still capture from the live surface and JPEG encoding

pub mod photo;
