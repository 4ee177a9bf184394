// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture core

use crate::session::{CaptureState, UserAction};
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for capture session and video source operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Capture session errors
    Capture(CaptureError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Capture errors
///
/// The first six variants are the failures a session can land in `Error` with.
/// The remaining ones are returned to callers whose request could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The host environment has no camera capability
    Unsupported(String),
    /// The user or platform refused camera access
    PermissionDenied(String),
    /// The device exists but could not be claimed (busy, unplugged)
    DeviceUnavailable(String),
    /// Attaching the feed to the preview surface or starting playback failed
    PlaybackFailed(String),
    /// The frame could not be turned into encoded image bytes
    EncodeFailed(String),
    /// Capture was attempted without an attached preview surface
    SurfaceMissing,
    /// The action is not valid in the session's current state
    InvalidAction {
        action: UserAction,
        state: CaptureState,
    },
    /// The action is valid in this state, but an earlier operation is still running
    Busy { action: UserAction },
    /// The session task has already shut down
    SessionClosed,
}

impl CaptureError {
    /// Whether this error moves a session into `Error` (as opposed to a rejected request)
    pub fn is_session_failure(&self) -> bool {
        !matches!(
            self,
            CaptureError::InvalidAction { .. }
                | CaptureError::Busy { .. }
                | CaptureError::SessionClosed
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Unsupported(msg) => write!(f, "Camera not supported: {}", msg),
            CaptureError::PermissionDenied(msg) => write!(f, "Camera permission denied: {}", msg),
            CaptureError::DeviceUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            CaptureError::PlaybackFailed(msg) => {
                write!(f, "Failed to start video playback: {}", msg)
            }
            CaptureError::EncodeFailed(msg) => write!(f, "Failed to encode photo: {}", msg),
            CaptureError::SurfaceMissing => write!(f, "No preview surface attached"),
            CaptureError::InvalidAction { action, state } => {
                write!(f, "Cannot {} while {}", action, state)
            }
            CaptureError::Busy { action } => {
                write!(f, "Cannot {} while the camera is busy", action)
            }
            CaptureError::SessionClosed => write!(f, "Capture session is closed"),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CaptureError {}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        CaptureError::EncodeFailed(err.to_string())
    }
}
