// SPDX-License-Identifier: GPL-3.0-only

//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use snapfeed::backends::camera::{CameraFrame, Constraints, HandleId, VideoSource};
use snapfeed::{
    CaptureError, CaptureResult, CaptureSession, CaptureState, CloseReason, Config,
    PreviewSurface, SessionHost, SessionSnapshot, UploadFile,
};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// Upper bound for anything a test waits on
pub const WAIT: Duration = Duration::from_secs(5);

/// What the next call of a scripted operation does
enum Step {
    Fail(CaptureError),
    Panic,
    /// Hold the call until the sender fires (or is dropped)
    Gate(oneshot::Receiver<()>),
    /// Grab only: hand back a frame with no pixels
    EmptyFrame,
}

#[derive(Default)]
struct Script {
    acquire: VecDeque<Step>,
    attach: VecDeque<Step>,
    grab: VecDeque<Step>,
    next_handle: u64,
    acquired: Vec<HandleId>,
    releases: HashMap<HandleId, u32>,
    outstanding: usize,
    max_outstanding: usize,
    acquire_calls: usize,
    grab_calls: usize,
    constraints_seen: Vec<Constraints>,
}

/// Video source whose behaviour each test scripts call by call
///
/// Unscripted calls succeed. Frames are a fixed pattern at the source's
/// native size, independent of the requested constraints.
pub struct ScriptedSource {
    width: u32,
    height: u32,
    script: Mutex<Script>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Self::with_resolution(320, 240)
    }

    pub fn with_resolution(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            width,
            height,
            script: Mutex::new(Script {
                next_handle: 1,
                ..Default::default()
            }),
        })
    }

    pub fn as_source(self: &Arc<Self>) -> Arc<dyn VideoSource> {
        self.clone()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub fn fail_next_acquire(&self, error: CaptureError) {
        self.script().acquire.push_back(Step::Fail(error));
    }

    pub fn panic_next_acquire(&self) {
        self.script().acquire.push_back(Step::Panic);
    }

    /// Hold the next acquisition open until the returned sender fires
    pub fn gate_next_acquire(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.script().acquire.push_back(Step::Gate(rx));
        tx
    }

    pub fn fail_next_attach(&self, error: CaptureError) {
        self.script().attach.push_back(Step::Fail(error));
    }

    pub fn gate_next_attach(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.script().attach.push_back(Step::Gate(rx));
        tx
    }

    pub fn fail_next_grab(&self, error: CaptureError) {
        self.script().grab.push_back(Step::Fail(error));
    }

    pub fn empty_next_grab(&self) {
        self.script().grab.push_back(Step::EmptyFrame);
    }

    pub fn gate_next_grab(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.script().grab.push_back(Step::Gate(rx));
        tx
    }

    /// Every handle issued so far, in order
    pub fn acquired(&self) -> Vec<HandleId> {
        self.script().acquired.clone()
    }

    pub fn release_count(&self, handle: HandleId) -> u32 {
        self.script().releases.get(&handle).copied().unwrap_or(0)
    }

    /// Claims issued and not yet released
    pub fn outstanding(&self) -> usize {
        self.script().outstanding
    }

    /// Most claims ever outstanding at once
    pub fn max_outstanding(&self) -> usize {
        self.script().max_outstanding
    }

    pub fn acquire_calls(&self) -> usize {
        self.script().acquire_calls
    }

    pub fn grab_calls(&self) -> usize {
        self.script().grab_calls
    }

    pub fn constraints_seen(&self) -> Vec<Constraints> {
        self.script().constraints_seen.clone()
    }

    fn is_live(&self, handle: HandleId) -> bool {
        let script = self.script();
        script.acquired.contains(&handle) && !script.releases.contains_key(&handle)
    }

    fn frame(&self) -> CameraFrame {
        let (width, height) = (self.width, self.height);
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 90, 255]);
            }
        }
        CameraFrame::rgba(width, height, data)
    }
}

/// Run one scripted step; `Ok(true)` means "produce an empty frame"
async fn run_step(step: Option<Step>) -> CaptureResult<bool> {
    match step {
        None => Ok(false),
        Some(Step::Fail(error)) => Err(error),
        Some(Step::Panic) => panic!("scripted panic"),
        Some(Step::Gate(gate)) => {
            let _ = gate.await;
            Ok(false)
        }
        Some(Step::EmptyFrame) => Ok(true),
    }
}

#[async_trait]
impl VideoSource for ScriptedSource {
    fn name(&self) -> &str {
        "Scripted source"
    }

    async fn acquire(&self, constraints: &Constraints) -> CaptureResult<HandleId> {
        let step = {
            let mut script = self.script();
            script.acquire_calls += 1;
            script.constraints_seen.push(*constraints);
            script.acquire.pop_front()
        };
        run_step(step).await?;

        let mut script = self.script();
        let handle = HandleId::new(script.next_handle);
        script.next_handle += 1;
        script.acquired.push(handle);
        script.outstanding += 1;
        script.max_outstanding = script.max_outstanding.max(script.outstanding);
        Ok(handle)
    }

    async fn attach(&self, handle: HandleId, surface: &PreviewSurface) -> CaptureResult<()> {
        let step = self.script().attach.pop_front();
        run_step(step).await?;
        if !self.is_live(handle) {
            return Err(CaptureError::PlaybackFailed(format!("{} released", handle)));
        }
        surface.start_playback(handle, self.frame());
        Ok(())
    }

    async fn grab_frame(
        &self,
        handle: HandleId,
        surface: &PreviewSurface,
    ) -> CaptureResult<CameraFrame> {
        let step = {
            let mut script = self.script();
            script.grab_calls += 1;
            script.grab.pop_front()
        };
        let empty = run_step(step).await?;
        if !self.is_live(handle) {
            return Err(CaptureError::EncodeFailed(format!("{} released", handle)));
        }
        if empty {
            return Ok(CameraFrame::rgba(0, 0, Vec::new()));
        }
        let frame = self.frame();
        surface.present(frame.clone());
        Ok(frame)
    }

    fn release(&self, handle: HandleId) {
        let mut script = self.script();
        let count = script.releases.entry(handle).or_insert(0);
        *count += 1;
        if *count == 1 && script.acquired.contains(&handle) {
            script.outstanding -= 1;
        }
    }
}

/// Host that records every callback
#[derive(Default)]
pub struct RecordingHost {
    uploads: Mutex<Vec<UploadFile>>,
    closes: Mutex<Vec<CloseReason>>,
}

impl RecordingHost {
    pub fn uploads(&self) -> Vec<UploadFile> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn closes(&self) -> Vec<CloseReason> {
        self.closes.lock().unwrap().clone()
    }
}

impl SessionHost for RecordingHost {
    fn on_artifact_ready(&self, upload: UploadFile) {
        self.uploads.lock().unwrap().push(upload);
    }

    fn on_closed(&self, reason: CloseReason) {
        self.closes.lock().unwrap().push(reason);
    }
}

pub fn open(source: Arc<dyn VideoSource>) -> (CaptureSession, Arc<RecordingHost>) {
    open_with(source, &Config::default())
}

pub fn open_with(
    source: Arc<dyn VideoSource>,
    config: &Config,
) -> (CaptureSession, Arc<RecordingHost>) {
    let host = Arc::new(RecordingHost::default());
    let session = CaptureSession::open(source, config, host.clone());
    (session, host)
}

/// Await `future`, failing the test if it takes longer than [`WAIT`]
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(WAIT, future)
        .await
        .expect("timed out waiting")
}

/// Poll `condition` until it holds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    within(async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
}

/// Wait for a settled state (no operation in flight)
pub async fn settle(session: &CaptureSession, state: CaptureState) -> SessionSnapshot {
    within(session.wait_for(|s| s.state == state && !s.busy))
        .await
        .expect("session closed while waiting")
}

/// Open a session with a surface attached and wait until it is live
pub async fn open_live(
    source: &Arc<ScriptedSource>,
) -> (CaptureSession, Arc<RecordingHost>, PreviewSurface) {
    let (session, host) = open(source.as_source());
    let surface = PreviewSurface::new("test");
    session.attach_surface(surface.clone()).await.unwrap();
    settle(&session, CaptureState::Live).await;
    (session, host, surface)
}
