// SPDX-License-Identifier: GPL-3.0-only

//! Observable session state

use crate::pipelines::photo::Artifact;
use uuid::Uuid;

/// Public lifecycle state of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureState {
    /// Acquiring the device and waiting for the preview to play
    Initializing,
    /// Live preview is visible and capturable
    Live,
    /// A photo has been taken; the device is released
    Captured,
    /// The current attempt failed; see the error detail
    Error,
    /// Terminal; all resources released
    Closed,
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureState::Initializing => write!(f, "initializing"),
            CaptureState::Live => write!(f, "live"),
            CaptureState::Captured => write!(f, "captured"),
            CaptureState::Error => write!(f, "failed"),
            CaptureState::Closed => write!(f, "closed"),
        }
    }
}

/// Explicit user actions a host can forward to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserAction {
    Capture,
    Retake,
    Retry,
    UsePhoto,
    Cancel,
}

impl std::fmt::Display for UserAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserAction::Capture => write!(f, "capture"),
            UserAction::Retake => write!(f, "retake"),
            UserAction::Retry => write!(f, "retry"),
            UserAction::UsePhoto => write!(f, "use photo"),
            UserAction::Cancel => write!(f, "cancel"),
        }
    }
}

/// Session identifier used in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form is plenty to tell sessions apart in logs
        let simple = self.0.simple().to_string();
        write!(f, "{}", &simple[..8])
    }
}

/// Point-in-time view of a session, published on every transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: CaptureState,
    /// Human-readable cause, only in `Error`
    pub error_detail: Option<String>,
    /// The taken photo, only in `Captured`
    pub artifact: Option<Artifact>,
    /// Whether the session currently owns a device claim
    pub holds_device: bool,
    /// Whether a preview surface is attached
    pub surface_attached: bool,
    /// Whether an async operation (acquire, attach, capture) is in flight
    pub busy: bool,
}

impl SessionSnapshot {
    pub(crate) fn initial() -> Self {
        Self {
            state: CaptureState::Initializing,
            error_detail: None,
            artifact: None,
            holds_device: false,
            surface_attached: false,
            busy: true,
        }
    }

    /// Actions a host should offer right now
    pub fn actions(&self) -> Vec<UserAction> {
        match self.state {
            CaptureState::Initializing => vec![UserAction::Cancel],
            CaptureState::Live if self.busy => vec![UserAction::Cancel],
            CaptureState::Live => vec![UserAction::Capture, UserAction::Cancel],
            CaptureState::Captured => {
                vec![UserAction::Retake, UserAction::UsePhoto, UserAction::Cancel]
            }
            CaptureState::Error => vec![UserAction::Retry, UserAction::Cancel],
            CaptureState::Closed => Vec::new(),
        }
    }

    pub fn allows(&self, action: UserAction) -> bool {
        self.actions().contains(&action)
    }

    /// Heading for the capture overlay
    pub fn title(&self) -> &'static str {
        match self.state {
            CaptureState::Initializing => "Starting camera...",
            CaptureState::Live => "Take Photo",
            CaptureState::Captured => "Review Photo",
            CaptureState::Error => "Camera Error",
            CaptureState::Closed => "",
        }
    }
}
