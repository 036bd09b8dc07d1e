// SPDX-License-Identifier: GPL-3.0-only

//! Media helpers shared by the capture path and the preview

pub mod conversions;

pub use conversions::{frame_to_rgba, sample_rgb};
