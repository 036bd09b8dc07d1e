// SPDX-License-Identifier: GPL-3.0-only

//! Pixel conversions from camera frames
//!
//! The capture path copies a frame into an [`RgbaImage`] raster; the terminal
//! preview samples individual pixels. Both understand every [`PixelFormat`]
//! a source can deliver.

use crate::backends::camera::types::{CameraFrame, PixelFormat};
use crate::errors::PhotoError;
use image::RgbaImage;

/// Copy a frame into a tightly packed RGBA raster of the same size
///
/// Row padding (stride larger than the visible width) is dropped.
pub fn frame_to_rgba(frame: &CameraFrame) -> Result<RgbaImage, PhotoError> {
    validate_layout(frame)?;

    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;
    let data = &frame.data[..];

    let mut raw = Vec::with_capacity(width * height * 4);
    match frame.format {
        PixelFormat::RGBA => {
            for row in data.chunks(stride).take(height) {
                raw.extend_from_slice(&row[..width * 4]);
            }
        }
        PixelFormat::BGRA => {
            for row in data.chunks(stride).take(height) {
                for px in row[..width * 4].chunks_exact(4) {
                    raw.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                }
            }
        }
        _ => {
            for y in 0..frame.height {
                for x in 0..frame.width {
                    let (r, g, b) = sample_rgb(frame, x, y);
                    raw.extend_from_slice(&[r, g, b, 255]);
                }
            }
        }
    }

    RgbaImage::from_raw(frame.width, frame.height, raw).ok_or_else(|| {
        PhotoError::UnsupportedFormat("raster size does not match frame".to_string())
    })
}

/// Check that the buffer is large enough for the declared geometry
fn validate_layout(frame: &CameraFrame) -> Result<(), PhotoError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(PhotoError::UnsupportedFormat(format!(
            "empty frame {}x{}",
            frame.width, frame.height
        )));
    }

    let min_stride = frame.format.min_stride(frame.width);
    if frame.stride < min_stride {
        return Err(PhotoError::UnsupportedFormat(format!(
            "stride {} shorter than row of {} bytes",
            frame.stride, min_stride
        )));
    }

    let stride = frame.stride as usize;
    let height = frame.height as usize;
    let mut required = stride * (height - 1) + min_stride as usize;
    if frame.format == PixelFormat::NV12 {
        required = stride * height + stride * height.div_ceil(2);
    }
    if frame.data.len() < required {
        return Err(PhotoError::UnsupportedFormat(format!(
            "{:?} buffer holds {} bytes, {}x{} needs {}",
            frame.format,
            frame.data.len(),
            frame.width,
            frame.height,
            required
        )));
    }
    Ok(())
}

/// Sample the RGB value of one pixel
///
/// Coordinates are clamped to the frame; out of range buffers read as black.
pub fn sample_rgb(frame: &CameraFrame, x: u32, y: u32) -> (u8, u8, u8) {
    if frame.width == 0 || frame.height == 0 {
        return (0, 0, 0);
    }
    let x = x.min(frame.width - 1);
    let y = y.min(frame.height - 1);
    let data = &frame.data[..];

    match frame.format {
        PixelFormat::RGBA | PixelFormat::BGRA => {
            let idx = (y * frame.stride + x * 4) as usize;
            if idx + 2 >= data.len() {
                return (0, 0, 0);
            }
            if frame.format == PixelFormat::RGBA {
                (data[idx], data[idx + 1], data[idx + 2])
            } else {
                (data[idx + 2], data[idx + 1], data[idx])
            }
        }
        PixelFormat::RGB24 => {
            let idx = (y * frame.stride + x * 3) as usize;
            if idx + 2 < data.len() {
                (data[idx], data[idx + 1], data[idx + 2])
            } else {
                (0, 0, 0)
            }
        }
        PixelFormat::Gray8 => {
            let idx = (y * frame.stride + x) as usize;
            data.get(idx).map_or((0, 0, 0), |&v| (v, v, v))
        }
        PixelFormat::NV12 => {
            let y_idx = (y * frame.stride + x) as usize;
            let Some(&luma) = data.get(y_idx) else {
                return (0, 0, 0);
            };

            // UV plane follows the Y plane at half resolution
            let uv_offset = (frame.stride * frame.height) as usize;
            let uv_idx = uv_offset + (y / 2) as usize * frame.stride as usize + (x & !1) as usize;
            if uv_idx + 1 >= data.len() {
                return (luma, luma, luma);
            }
            yuv_to_rgb(luma, data[uv_idx], data[uv_idx + 1])
        }
        PixelFormat::YUYV | PixelFormat::UYVY => {
            // Two pixels share chroma: Y0 U Y1 V / U Y0 V Y1
            let base = (y as usize) * (frame.stride as usize) + (x & !1) as usize * 2;
            if base + 3 >= data.len() {
                return (0, 0, 0);
            }
            let odd = x & 1 == 1;
            if frame.format == PixelFormat::YUYV {
                let luma = if odd { data[base + 2] } else { data[base] };
                yuv_to_rgb(luma, data[base + 1], data[base + 3])
            } else {
                let luma = if odd { data[base + 3] } else { data[base + 1] };
                yuv_to_rgb(luma, data[base], data[base + 2])
            }
        }
    }
}

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    fn frame(width: u32, height: u32, stride: u32, format: PixelFormat, data: Vec<u8>) -> CameraFrame {
        CameraFrame {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            format,
            stride,
            captured_at: Instant::now(),
        }
    }

    #[test]
    fn test_rgba_copy_drops_row_padding() {
        // 2x2 RGBA with 4 bytes of padding per row
        let data = vec![
            1, 2, 3, 255, 4, 5, 6, 255, 0, 0, 0, 0, //
            7, 8, 9, 255, 10, 11, 12, 255, 0, 0, 0, 0,
        ];
        let img = frame_to_rgba(&frame(2, 2, 12, PixelFormat::RGBA, data)).unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(1, 1).0, [10, 11, 12, 255]);
        assert_eq!(img.as_raw().len(), 16);
    }

    #[test]
    fn test_bgra_swaps_channels() {
        let img = frame_to_rgba(&frame(1, 1, 4, PixelFormat::BGRA, vec![30, 20, 10, 255])).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_gray_frame_converts() {
        let img = frame_to_rgba(&frame(2, 1, 2, PixelFormat::Gray8, vec![0, 200])).unwrap();
        assert_eq!(img.get_pixel(1, 0).0, [200, 200, 200, 255]);
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let result = frame_to_rgba(&frame(4, 4, 16, PixelFormat::RGBA, vec![0; 20]));
        assert!(matches!(result, Err(PhotoError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let result = frame_to_rgba(&frame(0, 0, 0, PixelFormat::RGBA, Vec::new()));
        assert!(matches!(result, Err(PhotoError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_yuv_neutral_chroma_is_gray() {
        assert_eq!(yuv_to_rgb(128, 128, 128), (128, 128, 128));
        let f = frame(2, 1, 4, PixelFormat::YUYV, vec![50, 128, 90, 128]);
        assert_eq!(sample_rgb(&f, 0, 0), (50, 50, 50));
        assert_eq!(sample_rgb(&f, 1, 0), (90, 90, 90));
    }

    #[test]
    fn test_sample_clamps_coordinates() {
        let f = frame(1, 1, 4, PixelFormat::RGBA, vec![9, 8, 7, 255]);
        assert_eq!(sample_rgb(&f, 100, 100), (9, 8, 7));
    }
}
