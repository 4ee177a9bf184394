// SPDX-License-Identifier: GPL-3.0-only

//! Session host boundary
//!
//! The host is whatever opened the capture UI (a post composer, the CLI).
//! It receives the finished photo and learns when the session is over.

use crate::constants::artifact_filename;
use crate::pipelines::photo::Artifact;
use std::sync::Arc;

/// Photo in the shape upload code expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Encoded bytes, identical to the artifact's
    pub bytes: Arc<[u8]>,
    /// `photo_<capture-millis>.jpg`
    pub filename: String,
    pub mime_type: &'static str,
}

impl UploadFile {
    /// Shares the artifact's bytes; nothing is copied or re-encoded
    pub fn from_artifact(artifact: &Artifact) -> Self {
        Self {
            bytes: Arc::clone(&artifact.bytes),
            filename: artifact_filename(artifact.captured_at.timestamp_millis()),
            mime_type: artifact.mime_type,
        }
    }
}

/// Why a session reached `Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// The photo was handed to the host
    HandedOff,
    /// The user cancelled
    Cancelled,
    /// Every session handle was dropped
    Disposed,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::HandedOff => write!(f, "handed off"),
            CloseReason::Cancelled => write!(f, "cancelled"),
            CloseReason::Disposed => write!(f, "disposed"),
        }
    }
}

/// Callbacks a session makes into its host
///
/// Both are called from the session task, at most once each per session.
pub trait SessionHost: Send + Sync {
    /// The user accepted the photo
    fn on_artifact_ready(&self, upload: UploadFile);

    /// The session is closed; called for every close reason
    fn on_closed(&self, _reason: CloseReason) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_upload_file_shares_bytes() {
        let mut artifact = Artifact::jpeg(vec![0xFF, 0xD8, 0xFF, 0xD9], 2, 2);
        artifact.captured_at = chrono::Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();

        let upload = UploadFile::from_artifact(&artifact);
        assert!(Arc::ptr_eq(&upload.bytes, &artifact.bytes));
        assert_eq!(upload.filename, "photo_1700000000123.jpg");
        assert_eq!(upload.mime_type, "image/jpeg");
    }
}
