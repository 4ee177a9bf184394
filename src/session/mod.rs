// SPDX-License-Identifier: GPL-3.0-only

//! Camera capture sessions
//!
//! A host opens a [`CaptureSession`], attaches a [`PreviewSurface`] once its
//! preview widget exists, and forwards the user's button presses. Progress is
//! observed through [`SessionSnapshot`]s; the finished photo arrives through
//! [`SessionHost::on_artifact_ready`].
//!
//! ```ignore
//! let session = CaptureSession::open(source, &config, host);
//! session.attach_surface(PreviewSurface::new("composer")).await?;
//! session.wait_for_state(CaptureState::Live).await?;
//! session.capture().await?;
//! session.wait_for_state(CaptureState::Captured).await?;
//! session.use_photo().await?;
//! ```
//!
//! Dropping every clone of the handle disposes the session, which releases
//! the camera just like `cancel()` does.

pub mod host;
mod machine;
pub mod state;

pub use host::{CloseReason, SessionHost, UploadFile};
pub use state::{CaptureState, SessionId, SessionSnapshot, UserAction};

use crate::backends::camera::VideoSource;
use crate::config::Config;
use crate::constants::SESSION_COMMAND_CAPACITY;
use crate::errors::{CaptureError, CaptureResult};
use crate::pipelines::photo::FrameCapturer;
use crate::preview::PreviewSurface;
use machine::{CaptureStateMachine, Command};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Handle to a running capture session (cheap to clone)
#[derive(Clone)]
pub struct CaptureSession {
    id: SessionId,
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl CaptureSession {
    /// Open a session; it starts in `Initializing` and begins acquiring at once
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(
        source: Arc<dyn VideoSource>,
        config: &Config,
        host: Arc<dyn SessionHost>,
    ) -> Self {
        let id = SessionId::new();
        let (commands_tx, commands_rx) = mpsc::channel(SESSION_COMMAND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::initial());

        let (machine, events_rx) = CaptureStateMachine::new(
            id,
            source,
            config.constraints(),
            FrameCapturer::new(config.jpeg_quality),
            host,
            snapshot_tx,
        );
        tokio::spawn(machine.run(commands_rx, events_rx));

        Self {
            id,
            commands: commands_tx,
            snapshot: snapshot_rx,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> CaptureState {
        self.snapshot.borrow().state
    }

    /// Receiver that sees every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Wait until a snapshot satisfies `predicate`
    ///
    /// Fails with `SessionClosed` if the session ends without ever matching.
    pub async fn wait_for<F>(&self, mut predicate: F) -> CaptureResult<SessionSnapshot>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut receiver = self.snapshot.clone();
        let snapshot = receiver
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .map_err(|_| CaptureError::SessionClosed)?;
        Ok(snapshot.clone())
    }

    pub async fn wait_for_state(&self, state: CaptureState) -> CaptureResult<SessionSnapshot> {
        self.wait_for(|snapshot| snapshot.state == state).await
    }

    /// Tell the session its preview surface now exists
    ///
    /// This is the readiness signal acquisition waits on before attaching.
    pub async fn attach_surface(&self, surface: PreviewSurface) -> CaptureResult<()> {
        self.commands
            .send(Command::AttachSurface(surface))
            .await
            .map_err(|_| CaptureError::SessionClosed)
    }

    /// Tell the session its preview surface went away
    pub async fn detach_surface(&self) -> CaptureResult<()> {
        self.commands
            .send(Command::DetachSurface)
            .await
            .map_err(|_| CaptureError::SessionClosed)
    }

    /// Take a photo; only accepted while `Live`
    pub async fn capture(&self) -> CaptureResult<()> {
        self.request(UserAction::Capture).await
    }

    /// Discard the photo and restart the camera; only accepted while `Captured`
    pub async fn retake(&self) -> CaptureResult<()> {
        self.request(UserAction::Retake).await
    }

    /// Restart the camera after a failure; only accepted in `Error`
    pub async fn retry(&self) -> CaptureResult<()> {
        self.request(UserAction::Retry).await
    }

    /// Hand the photo to the host and close; only accepted while `Captured`
    pub async fn use_photo(&self) -> CaptureResult<()> {
        self.request(UserAction::UsePhoto).await
    }

    /// Close the session from any state; repeated calls are no-ops
    pub async fn cancel(&self) -> CaptureResult<()> {
        match self.request(UserAction::Cancel).await {
            Err(CaptureError::InvalidAction {
                state: CaptureState::Closed,
                ..
            }) => Ok(()),
            other => other,
        }
    }

    async fn request(&self, action: UserAction) -> CaptureResult<()> {
        let closed = CaptureError::InvalidAction {
            action,
            state: CaptureState::Closed,
        };
        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(Command::Action { action, reply })
            .await
            .is_err()
        {
            return Err(closed);
        }
        response.await.unwrap_or(Err(closed))
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
