// SPDX-License-Identifier: GPL-3.0-only

//! Photo capture pipeline
//!
//! ```text
//! Live surface → Capture (raster copy, camera stop) → Encoding (JPEG)
//!                                                       ├─ preview data URL
//!                                                       └─ upload blob
//! ```

pub mod capture;
pub mod encoding;

pub use capture::{CapturedFrame, FrameCapturer};
pub use encoding::{EncodingQuality, JpegBlob, PhotoEncoder};
