// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Listing available cameras
//! - One-shot capture and upload
//! - Showing the effective configuration

use photobooth::app::{BoothModel, FlowState, Message, StatusMessage, Task, run_upload};
use photobooth::backends::camera::{CameraController, open_source};
use photobooth::constants::{paths, timing};
use photobooth::errors::{AppError, PhotoError};
use photobooth::upload::UploadClient;
use photobooth::Config;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// List all available cameras
pub fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let source = open_source(&config.camera_source);
    let cameras = source.enumerate_cameras()?;

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", source.name());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        if !camera.path.is_empty() {
            println!("      Path: {}", camera.path);
        }
        if let Some(driver) = &camera.driver {
            println!("      Driver: {}", driver);
        }
        match camera.facing {
            Some(facing) => println!("      Facing: {}", facing),
            None => println!("      Facing: unknown"),
        }
        println!();
    }

    Ok(())
}

/// Options for a one-shot capture
pub struct SnapOptions {
    pub comment: Option<String>,
    pub save: Option<PathBuf>,
    pub no_upload: bool,
}

/// Capture one photo, optionally save it, and submit it
pub fn snap(config: Config, options: SnapOptions) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let warmup = config.warmup();
    let uploader = UploadClient::from_config(&config)?;
    let camera = CameraController::new(
        open_source(&config.camera_source),
        config.stream_constraints(),
    );
    let mut model = BoothModel::new(config, camera, uploader);
    model.mount()?;

    println!("Capturing...");
    wait_for_frame(&mut model, warmup)?;

    let _ = model.update(Message::TakePhoto);
    if model.state() != FlowState::Previewing {
        return Err(match model.status() {
            Some(StatusMessage::CaptureFailed(e)) => AppError::Photo(e.clone()),
            _ => AppError::Photo(PhotoError::NoFrameAvailable),
        }
        .into());
    }

    let Some(capture) = model.flow().capture().cloned() else {
        return Err(AppError::Photo(PhotoError::NoFrameAvailable).into());
    };
    println!(
        "Captured {}x{} at {}",
        capture.width(),
        capture.height(),
        capture.captured_at().format("%H:%M:%S")
    );

    if let Some(save) = &options.save {
        let dir = output_dir(save);
        let blob = runtime.block_on(capture.to_jpeg_blob())?;
        let encoder = photobooth::pipelines::photo::PhotoEncoder::new(capture.quality());
        let path = runtime.block_on(encoder.save(&blob, &dir))?;
        println!("Saved: {}", path.display());
    }

    if options.no_upload {
        return Ok(());
    }

    if let Some(comment) = options.comment {
        let _ = model.update(Message::CommentChanged(comment));
    }

    let Task::Upload(job) = model.update(Message::Send) else {
        return Err("Nothing to upload".into());
    };

    let cancel = job.cancel.clone();
    ctrlc::set_handler(move || cancel.cancel())?;

    println!("Uploading to {}...", model.uploader().endpoint());
    let message = runtime.block_on(run_upload(Arc::clone(model.uploader()), job));
    let status = match &message {
        Message::UploadFinished {
            result: Ok(receipt),
            ..
        } => Some(receipt.status),
        _ => None,
    };
    let _ = model.update(message);

    match (model.state(), status) {
        (FlowState::Submitted, Some(status)) => {
            println!("Uploaded (HTTP {})", status);
            Ok(())
        }
        _ => {
            let reason = match model.status() {
                Some(StatusMessage::SendFailed(reason)) => reason.clone(),
                _ => "upload did not complete".to_string(),
            };
            Err(reason.into())
        }
    }
}

/// Print the effective configuration as JSON
pub fn print_config(config: &Config, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(path) => println!("# {}", path.display()),
        None => println!("# (defaults)"),
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Let the camera deliver frames until auto exposure settles
fn wait_for_frame(
    model: &mut BoothModel<UploadClient>,
    warmup: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let timeout = Duration::from_secs(timing::FIRST_FRAME_TIMEOUT_SECS) + warmup;

    while start.elapsed() < timeout {
        let _ = model.update(Message::Tick);
        if model.camera().surface().current_frame().is_some() && start.elapsed() >= warmup {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(timing::UI_POLL_INTERVAL_MS));
    }

    Err(AppError::Photo(PhotoError::NoFrameAvailable).into())
}

fn output_dir(save: &Path) -> PathBuf {
    if save.as_os_str().is_empty() {
        get_default_photo_dir()
    } else {
        save.to_path_buf()
    }
}

fn get_default_photo_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(paths::SAVE_FOLDER)
}
