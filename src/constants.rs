// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Preferred capture width requested from a video source (best effort)
pub const IDEAL_CAPTURE_WIDTH: u32 = 640;

/// Preferred capture height requested from a video source (best effort)
pub const IDEAL_CAPTURE_HEIGHT: u32 = 480;

/// MIME type of every artifact produced by a capture session
pub const ARTIFACT_MIME_TYPE: &str = "image/jpeg";

/// Filename prefix for hand-off uploads (`photo_<millis>.jpg`)
pub const ARTIFACT_FILE_PREFIX: &str = "photo_";

/// Filename extension for hand-off uploads
pub const ARTIFACT_FILE_EXTENSION: &str = "jpg";

/// Directory name used below the user's config and picture directories
pub const APP_DIR_NAME: &str = "snapfeed";

/// Config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Capacity of the command channel between session handles and the session task
pub const SESSION_COMMAND_CAPACITY: usize = 16;

/// Build the upload filename for an artifact captured at `timestamp_millis`
pub fn artifact_filename(timestamp_millis: i64) -> String {
    format!(
        "{}{}.{}",
        ARTIFACT_FILE_PREFIX, timestamp_millis, ARTIFACT_FILE_EXTENSION
    )
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
