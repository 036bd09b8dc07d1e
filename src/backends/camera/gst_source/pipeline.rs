// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer capture pipeline
//!
//! `v4l2src` (or `pipewiresrc` for the PipeWire default camera) converted to
//! RGBA and delivered through an appsink into the stream's frame channel.

use super::super::types::*;
use crate::constants::{pipeline, timing};
use crate::errors::CameraError;
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Build the pipeline description for a device
///
/// An empty path selects the PipeWire default camera.
pub fn pipeline_description(device_path: &str) -> String {
    let source = if device_path.is_empty() {
        "pipewiresrc".to_string()
    } else {
        format!("v4l2src device={}", device_path)
    };
    format!(
        "{} ! videoconvert ! video/x-raw,format={} ! appsink name=sink",
        source,
        pipeline::OUTPUT_FORMAT
    )
}

/// A running capture pipeline
pub struct CapturePipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    stopped: bool,
    ended: AtomicBool,
}

impl CapturePipeline {
    /// Create the pipeline, wire its appsink to `frame_sender` and start it
    pub fn start(device: &CameraDevice, frame_sender: FrameSender) -> CameraResult<Self> {
        gstreamer::init().map_err(|e| CameraError::InitializationFailed(e.to_string()))?;

        let description = pipeline_description(&device.path);
        info!(device = %device.name, pipeline = %description, "Creating capture pipeline");

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| CameraError::Backend(format!("Failed to create pipeline: {}", e)))?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| CameraError::Backend("Not a pipeline".to_string()))?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| CameraError::InitializationFailed("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| CameraError::InitializationFailed("Failed to cast appsink".to_string()))?;

        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        let frame_counter = Arc::new(AtomicU64::new(0));
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_num = frame_counter.fetch_add(1, Ordering::Relaxed);
                    let frame = extract_frame(appsink, frame_num)?;

                    let mut sender = frame_sender.clone();
                    if let Err(e) = sender.try_send(frame) {
                        if e.is_disconnected() {
                            debug!("Frame receiver dropped");
                            return Err(gstreamer::FlowError::Eos);
                        }
                        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                            debug!(frame = frame_num, "Frame dropped (channel full)");
                        }
                    }
                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        let mut capture = Self {
            pipeline,
            appsink,
            stopped: false,
            ended: AtomicBool::new(false),
        };

        if let Err(e) = capture.pipeline.set_state(gstreamer::State::Playing) {
            let err = capture
                .bus_error()
                .unwrap_or_else(|| CameraError::InitializationFailed(e.to_string()));
            capture.stop();
            return Err(err);
        }

        let (result, state, _) = capture.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        if let Some(err) = capture.bus_error() {
            capture.stop();
            return Err(err);
        }
        if result.is_err() {
            capture.stop();
            return Err(CameraError::InitializationFailed(
                "Pipeline failed to reach PLAYING".to_string(),
            ));
        }
        if state != gstreamer::State::Playing {
            warn!(?state, "Pipeline is not in PLAYING state yet");
        }

        info!(device = %device.name, "Capture pipeline running");
        Ok(capture)
    }

    /// Whether the pipeline still holds the device and delivers frames
    ///
    /// An error or end-of-stream posted on the bus after start (device
    /// unplugged, driver failure) ends the pipeline for good.
    pub fn is_running(&self) -> bool {
        if self.stopped || self.ended.load(Ordering::Acquire) {
            return false;
        }
        if let Some(reason) = self.bus_end() {
            warn!(reason = %reason, "Capture pipeline ended");
            self.ended.store(true, Ordering::Release);
            return false;
        }
        true
    }

    /// Stop the pipeline and release the device
    ///
    /// Safe to call more than once.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        debug!("Clearing appsink callbacks");
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            error!(error = %e, "Failed to stop pipeline");
            return;
        }
        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        match result {
            Ok(_) => info!(?state, "Capture pipeline stopped"),
            Err(e) => debug!(error = ?e, ?state, "Pipeline state change had issues"),
        }
    }

    /// Why the pipeline ended, if the bus says it did
    fn bus_end(&self) -> Option<CameraError> {
        let bus = self.pipeline.bus()?;
        let msg = bus.pop_filtered(&[
            gstreamer::MessageType::Error,
            gstreamer::MessageType::Eos,
        ])?;
        match msg.view() {
            gstreamer::MessageView::Error(err) => {
                let text = err.error().to_string();
                let debug_info = err.debug().map(|d| d.to_string()).unwrap_or_default();
                error!(error = %text, debug = %debug_info, "Pipeline error while streaming");
                Some(classify_error(&text, &debug_info))
            }
            gstreamer::MessageView::Eos(_) => Some(CameraError::StreamEnded),
            _ => None,
        }
    }

    /// First error message waiting on the bus, mapped to a camera error
    fn bus_error(&self) -> Option<CameraError> {
        let bus = self.pipeline.bus()?;
        let msg = bus.pop_filtered(&[gstreamer::MessageType::Error])?;
        match msg.view() {
            gstreamer::MessageView::Error(err) => {
                let text = err.error().to_string();
                let debug_info = err.debug().map(|d| d.to_string()).unwrap_or_default();
                error!(error = %text, debug = %debug_info, "Pipeline error");
                Some(classify_error(&text, &debug_info))
            }
            _ => None,
        }
    }
}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Map a GStreamer error message to a camera error
pub fn classify_error(message: &str, debug_info: &str) -> CameraError {
    let combined = format!("{} {}", message, debug_info).to_lowercase();
    if combined.contains("permission denied") || combined.contains("not authorized") {
        CameraError::PermissionDenied
    } else if combined.contains("no such file") || combined.contains("cannot identify device") {
        CameraError::NoCameraFound
    } else {
        CameraError::InitializationFailed(message.to_string())
    }
}

fn extract_frame(appsink: &AppSink, frame_num: u64) -> Result<CameraFrame, gstreamer::FlowError> {
    let captured_at = Instant::now();
    let sample = appsink.pull_sample().map_err(|_| gstreamer::FlowError::Eos)?;

    let buffer = sample.buffer().ok_or_else(|| {
        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
            error!(frame = frame_num, "No buffer in sample");
        }
        gstreamer::FlowError::Error
    })?;

    if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
        warn!(frame = frame_num, "Buffer marked as corrupted, skipping frame");
        return Err(gstreamer::FlowError::Error);
    }

    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
    let video_info = VideoInfo::from_caps(caps).map_err(|e| {
        error!(frame = frame_num, error = ?e, "Failed to get video info");
        gstreamer::FlowError::Error
    })?;
    let format = PixelFormat::from_gst_format(video_info.format().to_str().as_str()).ok_or_else(|| {
        error!(format = %video_info.format().to_str(), "Unexpected appsink format");
        gstreamer::FlowError::NotNegotiated
    })?;

    let map = buffer.map_readable().map_err(|_| gstreamer::FlowError::Error)?;

    if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
        debug!(
            frame = frame_num,
            width = video_info.width(),
            height = video_info.height(),
            stride = video_info.stride()[0],
            "Frame received"
        );
    }

    Ok(CameraFrame {
        width: video_info.width(),
        height: video_info.height(),
        data: Arc::from(map.as_slice()),
        format,
        stride: video_info.stride()[0] as u32,
        captured_at,
    })
}
