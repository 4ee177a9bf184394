// SPDX-License-Identifier: GPL-3.0-only

//! Capture state machine
//!
//! One task owns all session state. Acquisition, preview attach and photo
//! encoding run as separate tasks and report back as [`Event`]s tagged with the
//! attempt that started them. Results from an earlier attempt are stale and
//! are discarded; a stale device claim is released on the spot.
//!
//! ```text
//!                    ┌──────────────┐  acquire + attach ok   ┌──────┐
//!  open / retake ──▶ │ Initializing │ ─────────────────────▶ │ Live │
//!  retry             └──────┬───────┘                        └──┬───┘
//!                           │ failure                 capture ok│ │failure
//!                           ▼                                   ▼ ▼
//!                      ┌─────────┐                      ┌──────────┐
//!                      │  Error  │ ◀──────────────────  │ Captured │
//!                      └─────────┘                      └──────────┘
//!        cancel / dispose from any state, use photo from Captured ──▶ Closed
//! ```
//!
//! The device claim is dropped when leaving Initializing/Live in any direction.

use super::host::{CloseReason, SessionHost, UploadFile};
use super::state::{CaptureState, SessionId, SessionSnapshot, UserAction};
use crate::backends::camera::{
    Constraints, DeviceHandle, HandleId, VideoSource, acquire_handle,
};
use crate::errors::{CaptureError, CaptureResult};
use crate::pipelines::photo::{Artifact, FrameCapturer};
use crate::preview::PreviewSurface;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

/// Requests from session handles
pub(crate) enum Command {
    AttachSurface(PreviewSurface),
    DetachSurface,
    Action {
        action: UserAction,
        reply: oneshot::Sender<CaptureResult<()>>,
    },
}

/// Completions of background operations
pub(crate) enum Event {
    Acquired {
        attempt: u64,
        result: CaptureResult<DeviceHandle>,
    },
    Attached {
        attempt: u64,
        handle: HandleId,
        surface: PreviewSurface,
        result: CaptureResult<()>,
    },
    Captured {
        attempt: u64,
        result: CaptureResult<Artifact>,
    },
}

/// Internal phase, finer than the public [`CaptureState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Acquiring,
    /// Device claimed, no surface to play on yet
    AwaitingSurface,
    Attaching,
    Ready,
    /// Live, moving the feed onto a newly attached surface
    Reattaching,
    Capturing,
    Captured,
    Failed,
    Closed,
}

impl Phase {
    fn state(self) -> CaptureState {
        match self {
            Phase::Acquiring | Phase::AwaitingSurface | Phase::Attaching => {
                CaptureState::Initializing
            }
            Phase::Ready | Phase::Reattaching | Phase::Capturing => CaptureState::Live,
            Phase::Captured => CaptureState::Captured,
            Phase::Failed => CaptureState::Error,
            Phase::Closed => CaptureState::Closed,
        }
    }

    fn is_busy(self) -> bool {
        matches!(
            self,
            Phase::Acquiring | Phase::Attaching | Phase::Reattaching | Phase::Capturing
        )
    }
}

pub(crate) struct CaptureStateMachine {
    id: SessionId,
    source: Arc<dyn VideoSource>,
    constraints: Constraints,
    capturer: FrameCapturer,
    host: Arc<dyn SessionHost>,
    phase: Phase,
    attempt: u64,
    device: Option<DeviceHandle>,
    surface: Option<PreviewSurface>,
    artifact: Option<Artifact>,
    error_detail: Option<String>,
    events: mpsc::UnboundedSender<Event>,
    snapshot: watch::Sender<SessionSnapshot>,
}

impl CaptureStateMachine {
    pub(crate) fn new(
        id: SessionId,
        source: Arc<dyn VideoSource>,
        constraints: Constraints,
        capturer: FrameCapturer,
        host: Arc<dyn SessionHost>,
        snapshot: watch::Sender<SessionSnapshot>,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let machine = Self {
            id,
            source,
            constraints,
            capturer,
            host,
            phase: Phase::Acquiring,
            attempt: 0,
            device: None,
            surface: None,
            artifact: None,
            error_detail: None,
            events,
            snapshot,
        };
        (machine, events_rx)
    }

    /// Drive the session until it is closed
    ///
    /// Returning drops the event receiver, which drops (and so releases) any
    /// device claim that completes or is still queued after the close.
    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::UnboundedReceiver<Event>,
    ) {
        info!(session = %self.id, source = self.source.name(), "Capture session opened");
        self.begin_attempt();

        while self.phase != Phase::Closed {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => self.close(CloseReason::Disposed),
                },
                Some(event) = events.recv() => self.handle_event(event),
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::AttachSurface(surface) => self.on_surface_attached(surface),
            Command::DetachSurface => self.on_surface_detached(),
            Command::Action { action, reply } => {
                let result = self.apply(action);
                if let Err(e) = &result {
                    debug!(session = %self.id, %action, error = %e, "Action not applied");
                }
                let _ = reply.send(result);
            }
        }
    }

    fn apply(&mut self, action: UserAction) -> CaptureResult<()> {
        match (action, self.phase) {
            (UserAction::Cancel, Phase::Closed) => Ok(()),
            (UserAction::Cancel, _) => {
                self.close(CloseReason::Cancelled);
                Ok(())
            }
            (UserAction::Capture, Phase::Ready) => self.start_capture(),
            (UserAction::Capture, Phase::Reattaching | Phase::Capturing) => {
                Err(CaptureError::Busy { action })
            }
            (UserAction::Retake, Phase::Captured) => {
                info!(session = %self.id, "Retaking photo");
                self.begin_attempt();
                Ok(())
            }
            (UserAction::Retry, Phase::Failed) => {
                info!(session = %self.id, "Retrying camera start");
                self.begin_attempt();
                Ok(())
            }
            (UserAction::UsePhoto, Phase::Captured) => {
                self.hand_off();
                Ok(())
            }
            (action, phase) => Err(CaptureError::InvalidAction {
                action,
                state: phase.state(),
            }),
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Acquired { attempt, result } => self.on_acquired(attempt, result),
            Event::Attached {
                attempt,
                handle,
                surface,
                result,
            } => self.on_attached(attempt, handle, surface, result),
            Event::Captured { attempt, result } => self.on_captured(attempt, result),
        }
    }

    // =========================================================================
    // Acquisition
    // =========================================================================

    /// Start a fresh acquisition; shared by open, retake and retry
    fn begin_attempt(&mut self) {
        self.release_device();
        self.attempt += 1;
        self.phase = Phase::Acquiring;
        self.artifact = None;
        self.error_detail = None;
        info!(
            session = %self.id,
            attempt = self.attempt,
            constraints = %self.constraints,
            "Acquiring video source"
        );
        self.publish();

        let source = Arc::clone(&self.source);
        let constraints = self.constraints;
        let events = self.events.clone();
        let attempt = self.attempt;
        tokio::spawn(async move {
            let result = AssertUnwindSafe(acquire_handle(&source, &constraints))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(CaptureError::DeviceUnavailable(
                        "video source panicked during acquisition".to_string(),
                    ))
                });
            // If the session is gone the event comes back and the handle drops here
            let _ = events.send(Event::Acquired { attempt, result });
        });
    }

    fn on_acquired(&mut self, attempt: u64, result: CaptureResult<DeviceHandle>) {
        if attempt != self.attempt || self.phase != Phase::Acquiring {
            if let Ok(handle) = result {
                debug!(session = %self.id, handle = %handle.id(), "Releasing stale acquisition");
                handle.release();
            }
            return;
        }

        match result {
            Ok(handle) => {
                info!(session = %self.id, handle = %handle.id(), "Video source acquired");
                self.device = Some(handle);
                if self.surface.is_some() {
                    self.start_attach();
                } else {
                    debug!(session = %self.id, "Waiting for preview surface");
                    self.phase = Phase::AwaitingSurface;
                    self.publish();
                }
            }
            Err(e) => self.fail(e),
        }
    }

    // =========================================================================
    // Preview surface
    // =========================================================================

    fn on_surface_attached(&mut self, surface: PreviewSurface) {
        if self.surface.as_ref() == Some(&surface) {
            debug!(session = %self.id, surface = surface.id(), "Surface already attached");
            return;
        }
        if let Some(previous) = self.surface.take()
            && let Some(handle) = self.device.as_ref()
        {
            previous.stop_playback(handle.id());
        }

        info!(session = %self.id, surface = surface.id(), label = surface.label(), "Preview surface attached");
        self.surface = Some(surface);

        match self.phase {
            Phase::AwaitingSurface | Phase::Ready => self.start_attach(),
            // Acquiring picks the surface up once the claim arrives; an
            // in-flight attach notices the swap when it completes
            _ => self.publish(),
        }
    }

    fn on_surface_detached(&mut self) {
        let Some(surface) = self.surface.take() else {
            return;
        };
        if let Some(handle) = self.device.as_ref() {
            surface.stop_playback(handle.id());
        }
        info!(session = %self.id, surface = surface.id(), "Preview surface detached");
        self.publish();
    }

    fn start_attach(&mut self) {
        let (Some(handle), Some(surface)) = (
            self.device.as_ref().map(DeviceHandle::id),
            self.surface.clone(),
        ) else {
            return;
        };

        self.phase = if self.phase.state() == CaptureState::Live {
            Phase::Reattaching
        } else {
            Phase::Attaching
        };
        debug!(session = %self.id, %handle, surface = surface.id(), "Attaching feed to surface");
        self.publish();

        let source = Arc::clone(&self.source);
        let events = self.events.clone();
        let attempt = self.attempt;
        tokio::spawn(async move {
            let result = AssertUnwindSafe(source.attach(handle, &surface))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(CaptureError::PlaybackFailed(
                        "video source panicked during attach".to_string(),
                    ))
                });
            let _ = events.send(Event::Attached {
                attempt,
                handle,
                surface,
                result,
            });
        });
    }

    fn on_attached(
        &mut self,
        attempt: u64,
        handle: HandleId,
        surface: PreviewSurface,
        result: CaptureResult<()>,
    ) {
        let pending = attempt == self.attempt
            && matches!(self.phase, Phase::Attaching | Phase::Reattaching);
        let current = self.surface.as_ref() == Some(&surface);

        // Only one attach runs per attempt, so any surface this one started
        // and the session no longer shows must go dark
        if !pending || !current || result.is_err() {
            surface.stop_playback(handle);
        }
        if !pending {
            debug!(session = %self.id, surface = surface.id(), "Discarding stale attach");
            return;
        }

        if let Err(e) = result {
            self.fail(e);
            return;
        }

        match self.surface.as_ref() {
            Some(_) if current => {
                info!(session = %self.id, surface = surface.id(), "Preview is live");
                self.phase = Phase::Ready;
                self.publish();
            }
            Some(_) => {
                debug!(session = %self.id, "Surface replaced during attach, attaching again");
                self.start_attach();
            }
            None if self.phase == Phase::Attaching => {
                self.phase = Phase::AwaitingSurface;
                self.publish();
            }
            None => {
                self.phase = Phase::Ready;
                self.publish();
            }
        }
    }

    // =========================================================================
    // Capture
    // =========================================================================

    fn start_capture(&mut self) -> CaptureResult<()> {
        let Some(handle) = self.device.as_ref().map(DeviceHandle::id) else {
            let error = CaptureError::DeviceUnavailable("no active device claim".to_string());
            self.fail(error.clone());
            return Err(error);
        };
        let Some(surface) = self.surface.clone() else {
            self.fail(CaptureError::SurfaceMissing);
            return Err(CaptureError::SurfaceMissing);
        };

        self.phase = Phase::Capturing;
        self.publish();

        let source = Arc::clone(&self.source);
        let capturer = self.capturer;
        let events = self.events.clone();
        let attempt = self.attempt;
        tokio::spawn(async move {
            let result = AssertUnwindSafe(capturer.capture(&*source, handle, Some(&surface)))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(CaptureError::EncodeFailed("capture panicked".to_string())));
            let _ = events.send(Event::Captured { attempt, result });
        });
        Ok(())
    }

    fn on_captured(&mut self, attempt: u64, result: CaptureResult<Artifact>) {
        if attempt != self.attempt || self.phase != Phase::Capturing {
            return;
        }

        match result {
            Ok(artifact) => {
                // A still does not need the camera any more
                self.release_device();
                info!(
                    session = %self.id,
                    width = artifact.width,
                    height = artifact.height,
                    size = artifact.len(),
                    "Photo captured"
                );
                self.artifact = Some(artifact);
                self.phase = Phase::Captured;
                self.publish();
            }
            Err(e) => self.fail(e),
        }
    }

    fn hand_off(&mut self) {
        if let Some(artifact) = self.artifact.take() {
            let upload = UploadFile::from_artifact(&artifact);
            info!(
                session = %self.id,
                filename = %upload.filename,
                size = upload.bytes.len(),
                "Handing photo to host"
            );
            self.host.on_artifact_ready(upload);
        }
        self.close(CloseReason::HandedOff);
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    fn fail(&mut self, error: CaptureError) {
        // Error only ever shows a failure kind, whatever a source returned
        let error = if error.is_session_failure() {
            error
        } else {
            CaptureError::DeviceUnavailable(error.to_string())
        };
        warn!(session = %self.id, error = %error, "Capture session failed");
        self.release_device();
        self.artifact = None;
        self.error_detail = Some(error.to_string());
        self.phase = Phase::Failed;
        self.publish();
    }

    fn close(&mut self, reason: CloseReason) {
        if self.phase == Phase::Closed {
            return;
        }
        self.release_device();
        self.surface = None;
        self.artifact = None;
        self.error_detail = None;
        self.phase = Phase::Closed;
        // Anything still in flight now belongs to a dead attempt
        self.attempt += 1;
        info!(session = %self.id, %reason, "Capture session closed");
        self.publish();
        self.host.on_closed(reason);
    }

    fn release_device(&mut self) {
        if let Some(handle) = self.device.take() {
            if let Some(surface) = &self.surface {
                surface.stop_playback(handle.id());
            }
            handle.release();
        }
    }

    fn publish(&self) {
        self.snapshot.send_replace(SessionSnapshot {
            state: self.phase.state(),
            error_detail: self.error_detail.clone(),
            artifact: self.artifact.clone(),
            holds_device: self.device.is_some(),
            surface_attached: self.surface.is_some(),
            busy: self.phase.is_busy(),
        });
    }
}

impl Drop for CaptureStateMachine {
    fn drop(&mut self) {
        // Covers the session task being aborted or unwinding
        self.close(CloseReason::Disposed);
    }
}
