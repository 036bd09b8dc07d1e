// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture flow

mod common;

use common::*;
use photobooth::app::{BoothRuntime, StatusMessage};
use photobooth::errors::{AppError, CameraError, PhotoError, UploadError};
use photobooth::upload::UploadReceipt;
use photobooth::{FlowState, Message, Task};
use tokio::runtime::Handle;

#[test]
fn test_mount_binds_stream_before_capture() {
    let (model, state) = ready_booth(FakeUploader::ok());

    assert_eq!(model.state(), FlowState::Capturing);
    assert!(model.camera().is_streaming());
    assert_eq!(state.acquisitions(), 1);
    assert_eq!(model.camera().surface().video_width(), FRAME_WIDTH);

    let constraints = state.last_constraints().unwrap();
    assert!(!constraints.audio);
    assert_eq!(constraints.facing_mode, photobooth::backends::camera::FacingMode::User);
}

#[test]
fn test_take_photo_stops_camera_and_shows_preview() {
    let (mut model, state) = ready_booth(FakeUploader::ok());

    assert!(model.update(Message::TakePhoto).is_none());

    assert_eq!(model.state(), FlowState::Previewing);
    assert!(state.all_tracks_stopped());
    assert!(!model.camera().is_streaming());

    let capture = model.flow().capture().unwrap();
    assert_eq!((capture.width(), capture.height()), (FRAME_WIDTH, FRAME_HEIGHT));
    assert!(capture.preview_data_url().starts_with("data:image/jpeg;base64,"));
    assert_eq!(capture.raster().get_pixel(0, 0).0, [30, 120, 200, 255]);
    assert_eq!(model.flow().comment(), "");
}

#[test]
fn test_take_photo_without_frame_keeps_camera() {
    let (source, state) = FakeCameraSource::granting(solid_frame(8, 8, [0, 0, 0, 255]));
    let mut model = booth(source, FakeUploader::ok());
    model.mount().unwrap();

    // No tick yet, so the surface has nothing to copy
    let _ = model.update(Message::TakePhoto);

    assert_eq!(model.state(), FlowState::Capturing);
    assert_eq!(
        model.status(),
        Some(&StatusMessage::CaptureFailed(PhotoError::NoFrameAvailable))
    );
    assert!(model.camera().is_streaming());
    assert_eq!(state.live_tracks(), 1);
}

#[test]
fn test_denied_camera_stays_capturing() {
    let (source, state) = FakeCameraSource::denying();
    let mut model = booth(source, FakeUploader::ok());

    let err = model.mount().unwrap_err();
    assert!(matches!(err, AppError::Camera(CameraError::PermissionDenied)));
    assert_eq!(model.state(), FlowState::Capturing);
    assert!(!model.camera().is_streaming());
    assert_eq!(
        model.status(),
        Some(&StatusMessage::CameraUnavailable(CameraError::PermissionDenied))
    );

    // Without a stream there is nothing to capture, and no new camera request
    state.set_granted(true);
    let _ = model.update(Message::TakePhoto);
    let _ = model.update(Message::TakePhoto);

    assert_eq!(model.state(), FlowState::Capturing);
    assert_eq!(state.acquisitions(), 1);
    assert!(!model.camera().is_streaming());
    assert_eq!(model.status(), Some(&StatusMessage::CaptureFailed(PhotoError::NoVideoSurface)));
}

#[test]
fn test_lost_camera_is_not_captured_or_reacquired() {
    let (mut model, state) = ready_booth(FakeUploader::ok());

    state.unplug();
    let _ = model.update(Message::Tick);

    assert!(!model.camera().is_streaming());
    assert_eq!(
        model.status(),
        Some(&StatusMessage::CameraUnavailable(CameraError::StreamEnded))
    );

    let _ = model.update(Message::TakePhoto);
    assert_eq!(model.state(), FlowState::Capturing);
    assert!(model.flow().capture().is_none());
    assert_eq!(state.acquisitions(), 1);
}

#[test]
fn test_retry_discards_capture_and_restarts_camera() {
    let (mut model, state) = ready_booth(FakeUploader::ok());
    let _ = model.update(Message::TakePhoto);
    let _ = model.update(Message::CommentChanged("first try".to_string()));
    assert_eq!(model.flow().comment(), "first try");

    let _ = model.update(Message::Retry);

    assert_eq!(model.state(), FlowState::Capturing);
    assert_eq!(model.flow().comment(), "");
    assert!(model.flow().capture().is_none());
    assert!(model.camera().is_streaming());
    assert_eq!(state.acquisitions(), 2);
    assert_eq!(state.track_count(), 2);
    assert!(state.track_stopped(0));
    assert!(!state.track_stopped(1));
}

#[test]
fn test_comment_editing() {
    let (mut model, _state) = ready_booth(FakeUploader::ok());

    // Ignored while capturing
    let _ = model.update(Message::CommentInput('x'));
    let _ = model.update(Message::TakePhoto);
    assert_eq!(model.flow().comment(), "");

    for c in "holaa".chars() {
        let _ = model.update(Message::CommentInput(c));
    }
    let _ = model.update(Message::CommentBackspace);
    assert_eq!(model.flow().comment(), "hola");
}

#[test]
fn test_actions_outside_their_state_are_ignored() {
    let (mut model, state) = ready_booth(FakeUploader::ok());

    assert!(model.update(Message::Send).is_none());
    assert!(model.update(Message::Retry).is_none());
    assert_eq!(model.state(), FlowState::Capturing);
    assert_eq!(state.acquisitions(), 1);
}

#[test]
fn test_send_is_single_flight() {
    let (mut model, _state) = ready_booth(FakeUploader::ok());
    let _ = model.update(Message::TakePhoto);
    let _ = model.update(Message::CommentChanged("hi".to_string()));

    let Task::Upload(job) = model.update(Message::Send) else {
        panic!("send should start an upload");
    };
    assert_eq!(job.comment, "hi");
    assert!(model.is_uploading());
    assert_eq!(model.status(), Some(&StatusMessage::Sending));

    assert!(model.update(Message::Send).is_none());
}

#[test]
fn test_stale_completion_is_ignored() {
    let (mut model, _state) = ready_booth(FakeUploader::ok());
    let _ = model.update(Message::TakePhoto);
    let Task::Upload(job) = model.update(Message::Send) else {
        panic!("send should start an upload");
    };

    let receipt = UploadReceipt {
        status: 200,
        bytes: 1,
        sent_at: chrono::Local::now(),
    };
    let _ = model.update(Message::UploadFinished {
        generation: job.generation + 1,
        result: Ok(receipt.clone()),
    });
    assert_eq!(model.state(), FlowState::Previewing);
    assert!(model.is_uploading());

    let _ = model.update(Message::UploadFinished {
        generation: job.generation,
        result: Ok(receipt),
    });
    assert_eq!(model.state(), FlowState::Submitted);
}

#[tokio::test]
async fn test_scenario_capture_and_send_empty_comment() {
    let (model, _state) = ready_booth(FakeUploader::ok());
    let mut booth = BoothRuntime::new(model, Handle::current());

    booth.send(Message::TakePhoto);
    booth.send(Message::Send);
    assert!(booth.process_next().await);

    let model = booth.model();
    assert_eq!(model.state(), FlowState::Submitted);
    assert!(model.flow().capture().is_none());
    assert!(!model.is_uploading());

    let calls = model.uploader().calls();
    assert_eq!(calls.len(), 1);
    let (blob, comment) = &calls[0];
    assert_eq!(comment, "");
    let decoded = image::load_from_memory(&blob.data).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (FRAME_WIDTH, FRAME_HEIGHT));
}

#[tokio::test]
async fn test_submitted_is_terminal() {
    let (model, state) = ready_booth(FakeUploader::ok());
    let mut booth = BoothRuntime::new(model, Handle::current());
    booth.send(Message::TakePhoto);
    booth.send(Message::Send);
    booth.process_next().await;

    booth.send(Message::Retry);
    booth.send(Message::TakePhoto);
    booth.send(Message::Send);

    assert_eq!(booth.model().state(), FlowState::Submitted);
    assert_eq!(state.acquisitions(), 1);
    assert_eq!(booth.model().uploader().calls().len(), 1);
}

#[tokio::test]
async fn test_failed_upload_keeps_preview() {
    let (model, _state) = ready_booth(FakeUploader::failing(UploadError::Connect(
        "connection refused".to_string(),
    )));
    let mut booth = BoothRuntime::new(model, Handle::current());

    booth.send(Message::TakePhoto);
    booth.send(Message::CommentChanged("¡Hola!".to_string()));
    let preview = booth.model().flow().capture().unwrap().preview_data_url().to_string();
    booth.send(Message::Send);
    booth.process_next().await;

    let model = booth.model();
    assert_eq!(model.state(), FlowState::Previewing);
    assert_eq!(model.flow().comment(), "¡Hola!");
    assert_eq!(model.flow().capture().unwrap().preview_data_url(), preview);
    assert!(matches!(model.status(), Some(StatusMessage::SendFailed(_))));
    assert!(!model.is_uploading());

    // Sending again is allowed
    booth.send(Message::Send);
    assert!(booth.model().is_uploading());
}

#[tokio::test]
async fn test_retry_cancels_in_flight_upload() {
    let (uploader, gate) = FakeUploader::gated();
    let (model, state) = ready_booth(uploader);
    let mut booth = BoothRuntime::new(model, Handle::current());

    booth.send(Message::TakePhoto);
    booth.send(Message::Send);
    assert!(booth.model().is_uploading());

    booth.send(Message::Retry);
    assert!(!booth.model().is_uploading());
    assert_eq!(booth.model().state(), FlowState::Capturing);

    // The cancelled upload still reports back, and is ignored
    assert!(booth.process_next().await);
    gate.notify_one();

    let model = booth.model();
    assert_eq!(model.state(), FlowState::Capturing);
    assert!(model.status().is_none());
    assert!(model.camera().is_streaming());
    assert_eq!(state.acquisitions(), 2);
}
