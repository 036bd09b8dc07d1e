// SPDX-License-Identifier: GPL-3.0-only

//! Shared fakes for integration tests

#![allow(dead_code)]

use photobooth::backends::camera::{
    CameraController, CameraDevice, CameraFrame, CameraResult, CameraSource, FacingMode,
    FrameSender, MediaStream, MediaTrack, StreamConstraints,
};
use photobooth::errors::{CameraError, UploadError};
use photobooth::pipelines::photo::JpegBlob;
use photobooth::upload::{UploadReceipt, Uploader};
use photobooth::{BoothModel, Config};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const FRAME_WIDTH: u32 = 64;
pub const FRAME_HEIGHT: u32 = 48;

/// Solid color RGBA frame
pub fn solid_frame(width: u32, height: u32, rgba: [u8; 4]) -> CameraFrame {
    let data = rgba
        .iter()
        .copied()
        .cycle()
        .take((width * height * 4) as usize)
        .collect();
    CameraFrame::from_rgba(width, height, data)
}

/// What the fake camera saw
#[derive(Default)]
pub struct FakeCameraState {
    granted: AtomicBool,
    unplugged: AtomicBool,
    acquisitions: AtomicUsize,
    frame: Mutex<Option<CameraFrame>>,
    tracks: Mutex<Vec<Arc<AtomicBool>>>,
    constraints: Mutex<Vec<StreamConstraints>>,
}

impl FakeCameraState {
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.lock().unwrap().len()
    }

    /// Whether the track handed out by the `index`-th grant was stopped
    pub fn track_stopped(&self, index: usize) -> bool {
        self.tracks.lock().unwrap()[index].load(Ordering::SeqCst)
    }

    pub fn all_tracks_stopped(&self) -> bool {
        self.tracks
            .lock()
            .unwrap()
            .iter()
            .all(|stopped| stopped.load(Ordering::SeqCst))
    }

    pub fn live_tracks(&self) -> usize {
        self.tracks
            .lock()
            .unwrap()
            .iter()
            .filter(|stopped| !stopped.load(Ordering::SeqCst))
            .count()
    }

    pub fn last_constraints(&self) -> Option<StreamConstraints> {
        self.constraints.lock().unwrap().last().copied()
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }

    /// Make every handed out track end on its own, as if the device vanished
    pub fn unplug(&self) {
        self.unplugged.store(true, Ordering::SeqCst);
    }
}

/// Camera capability that grants or denies on demand
///
/// Every granted stream starts with one frame already queued.
pub struct FakeCameraSource {
    state: Arc<FakeCameraState>,
}

impl FakeCameraSource {
    pub fn granting(frame: CameraFrame) -> (Self, Arc<FakeCameraState>) {
        let state = Arc::new(FakeCameraState::default());
        state.granted.store(true, Ordering::SeqCst);
        *state.frame.lock().unwrap() = Some(frame);
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }

    pub fn denying() -> (Self, Arc<FakeCameraState>) {
        let state = Arc::new(FakeCameraState::default());
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

impl CameraSource for FakeCameraSource {
    fn name(&self) -> &str {
        "fake"
    }

    fn enumerate_cameras(&self) -> CameraResult<Vec<CameraDevice>> {
        Ok(vec![CameraDevice {
            name: "Fake Camera".to_string(),
            path: "/dev/fake0".to_string(),
            driver: None,
            facing: Some(FacingMode::User),
        }])
    }

    fn acquire(&mut self, constraints: &StreamConstraints) -> CameraResult<MediaStream> {
        self.state.acquisitions.fetch_add(1, Ordering::SeqCst);
        self.state.constraints.lock().unwrap().push(*constraints);
        if !self.state.granted.load(Ordering::SeqCst) {
            return Err(CameraError::PermissionDenied);
        }

        let (mut sender, receiver) = futures::channel::mpsc::channel(4);
        if let Some(frame) = self.state.frame.lock().unwrap().clone() {
            sender.try_send(frame).unwrap();
        }

        let stopped = Arc::new(AtomicBool::new(false));
        self.state.tracks.lock().unwrap().push(Arc::clone(&stopped));
        Ok(MediaStream::new(
            vec![Box::new(FakeTrack {
                stopped,
                state: Arc::clone(&self.state),
                sender: Some(sender),
            })],
            receiver,
        ))
    }
}

struct FakeTrack {
    stopped: Arc<AtomicBool>,
    state: Arc<FakeCameraState>,
    sender: Option<FrameSender>,
}

impl MediaTrack for FakeTrack {
    fn label(&self) -> &str {
        "Fake Camera"
    }

    fn stop(&mut self) {
        self.sender = None;
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst) && !self.state.unplugged.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
enum Outcome {
    Status(u16),
    Fail(UploadError),
}

/// Records submissions and answers with a fixed outcome
pub struct FakeUploader {
    calls: Arc<Mutex<Vec<(JpegBlob, String)>>>,
    outcome: Outcome,
    gate: Option<Arc<tokio::sync::Notify>>,
}

impl FakeUploader {
    pub fn ok() -> Self {
        Self {
            calls: Arc::default(),
            outcome: Outcome::Status(201),
            gate: None,
        }
    }

    pub fn failing(error: UploadError) -> Self {
        Self {
            calls: Arc::default(),
            outcome: Outcome::Fail(error),
            gate: None,
        }
    }

    /// Succeeds only after the returned gate is notified
    pub fn gated() -> (Self, Arc<tokio::sync::Notify>) {
        let gate = Arc::new(tokio::sync::Notify::new());
        (
            Self {
                calls: Arc::default(),
                outcome: Outcome::Status(200),
                gate: Some(Arc::clone(&gate)),
            },
            gate,
        )
    }

    pub fn calls(&self) -> Vec<(JpegBlob, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Uploader for FakeUploader {
    fn submit(
        &self,
        blob: JpegBlob,
        comment: String,
    ) -> impl Future<Output = Result<UploadReceipt, UploadError>> + Send {
        let calls = Arc::clone(&self.calls);
        let outcome = self.outcome.clone();
        let gate = self.gate.clone();
        async move {
            let bytes = blob.len();
            calls.lock().unwrap().push((blob, comment));
            if let Some(gate) = gate {
                gate.notified().await;
            }
            match outcome {
                Outcome::Status(status) => Ok(UploadReceipt {
                    status,
                    bytes,
                    sent_at: chrono::Local::now(),
                }),
                Outcome::Fail(error) => Err(error),
            }
        }
    }
}

/// Booth wired to a fake camera, not yet mounted
pub fn booth<U: Uploader>(source: FakeCameraSource, uploader: U) -> BoothModel<U> {
    let config = Config::default();
    let camera = CameraController::new(Box::new(source), config.stream_constraints());
    BoothModel::new(config, camera, uploader)
}

/// Booth that is mounted and already shows its first frame
pub fn ready_booth<U: Uploader>(uploader: U) -> (BoothModel<U>, Arc<FakeCameraState>) {
    let (source, state) =
        FakeCameraSource::granting(solid_frame(FRAME_WIDTH, FRAME_HEIGHT, [30, 120, 200, 255]));
    let mut model = booth(source, uploader);
    model.mount().unwrap();
    let _ = model.update(photobooth::Message::Tick);
    (model, state)
}
