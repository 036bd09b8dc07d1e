// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the camera controller and frame capture

mod common;

use common::*;
use photobooth::backends::camera::{
    CameraController, CameraSource, CameraSourceKind, StreamConstraints,
};
use photobooth::backends::virtual_camera::FileCameraSource;
use photobooth::errors::{CameraError, PhotoError};
use photobooth::pipelines::photo::{EncodingQuality, FrameCapturer};
use std::time::{Duration, Instant};

fn controller(source: FakeCameraSource) -> CameraController {
    CameraController::new(Box::new(source), StreamConstraints::default())
}

#[test]
fn test_stop_without_stream_is_noop() {
    let (source, state) = FakeCameraSource::granting(solid_frame(4, 4, [0; 4]));
    let mut camera = controller(source);

    camera.stop();
    camera.stop();

    assert!(!camera.is_streaming());
    assert_eq!(state.acquisitions(), 0);
}

#[test]
fn test_start_failure_leaves_surface_unbound() {
    let (source, state) = FakeCameraSource::denying();
    let mut camera = controller(source);

    assert_eq!(camera.start(), Err(CameraError::PermissionDenied));
    assert!(!camera.surface().is_bound());
    assert_eq!(camera.surface().video_width(), 0);
    assert_eq!(state.acquisitions(), 1);
}

#[test]
fn test_restart_releases_previous_stream() {
    let (source, state) = FakeCameraSource::granting(solid_frame(4, 4, [0; 4]));
    let mut camera = controller(source);

    camera.start().unwrap();
    let first_id = camera.surface().stream_id();
    camera.start().unwrap();

    assert_ne!(camera.surface().stream_id(), first_id);
    assert!(state.track_stopped(0));
    assert_eq!(state.live_tracks(), 1);
    assert_eq!(camera.acquisition_count(), 2);
}

#[test]
fn test_poll_frames_shows_newest_frame() {
    let (source, _state) = FakeCameraSource::granting(solid_frame(16, 9, [1, 2, 3, 255]));
    let mut camera = controller(source);
    camera.start().unwrap();

    assert_eq!(camera.surface().video_width(), 0);
    assert_eq!(camera.poll_frames(), Ok(1));
    assert_eq!(camera.poll_frames(), Ok(0));
    assert_eq!(
        (camera.surface().video_width(), camera.surface().video_height()),
        (16, 9)
    );
}

#[test]
fn test_ended_stream_clears_surface() {
    let (source, state) = FakeCameraSource::granting(solid_frame(16, 9, [1, 2, 3, 255]));
    let mut camera = controller(source);
    camera.start().unwrap();
    camera.poll_frames().unwrap();
    assert!(camera.surface().current_frame().is_some());

    state.unplug();

    assert_eq!(camera.poll_frames(), Err(CameraError::StreamEnded));
    assert!(!camera.is_streaming());
    assert!(camera.surface().current_frame().is_none());
    assert!(state.track_stopped(0));
    assert_eq!(camera.poll_frames(), Ok(0));

    let err = FrameCapturer::default().capture(&mut camera).unwrap_err();
    assert_eq!(err, PhotoError::NoVideoSurface);
    assert_eq!(state.acquisitions(), 1);
}

#[test]
fn test_drop_stops_tracks() {
    let (source, state) = FakeCameraSource::granting(solid_frame(4, 4, [0; 4]));
    let mut camera = controller(source);
    camera.start().unwrap();
    drop(camera);

    assert!(state.all_tracks_stopped());
}

#[test]
fn test_capture_without_stream_fails() {
    let (source, _state) = FakeCameraSource::granting(solid_frame(4, 4, [0; 4]));
    let mut camera = controller(source);

    let err = FrameCapturer::default().capture(&mut camera).unwrap_err();
    assert_eq!(err, PhotoError::NoVideoSurface);
}

#[test]
fn test_capture_matches_native_resolution() {
    let (source, state) = FakeCameraSource::granting(solid_frame(320, 240, [10, 20, 30, 255]));
    let mut camera = controller(source);
    camera.start().unwrap();
    camera.poll_frames().unwrap();

    let capture = FrameCapturer::new(EncodingQuality::Low)
        .capture(&mut camera)
        .unwrap();

    assert_eq!((capture.width(), capture.height()), (320, 240));
    assert_eq!(capture.quality(), EncodingQuality::Low);
    assert!(state.all_tracks_stopped());
    assert!(!camera.is_streaming());
}

#[test]
fn test_capture_from_file_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("guest.png");
    image::RgbaImage::from_pixel(40, 30, image::Rgba([250, 200, 0, 255]))
        .save(&path)
        .unwrap();

    let source = FileCameraSource::new(path.clone());
    assert_eq!(source.enumerate_cameras().unwrap().len(), 1);

    let mut camera = CameraController::new(Box::new(source), StreamConstraints::default());
    camera.start().unwrap();

    let deadline = Instant::now() + Duration::from_secs(2);
    while camera.poll_frames() == Ok(0) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }

    let capture = FrameCapturer::default().capture(&mut camera).unwrap();
    assert_eq!((capture.width(), capture.height()), (40, 30));
    assert!(!camera.is_streaming());
}

#[test]
fn test_source_kind_from_config_json() {
    let kind: CameraSourceKind = serde_json::from_str("\"file:/srv/booth/guest.png\"").unwrap();
    assert_eq!(
        kind,
        CameraSourceKind::File("/srv/booth/guest.png".into())
    );
    assert!(serde_json::from_str::<CameraSourceKind>("\"webcam\"").is_err());
}
