// SPDX-License-Identifier: GPL-3.0-only

//! Snapfeed - camera capture for a photo-sharing feed
//!
//! This library provides the capture-session core the post composer uses to
//! take a photo: acquire a camera, show a live preview, grab a still, let the
//! user review it, and hand the accepted JPEG back as an upload file.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`session`]: The capture state machine and its public handle
//! - [`backends`]: Video source abstraction and bundled sources
//! - [`preview`]: Preview surfaces a feed plays on
//! - [`pipelines`]: Frame-to-JPEG photo pipeline
//! - [`config`]: User configuration handling
//! - [`storage`]: Saving handed-off photos
//!
//! # Example
//!
//! ```ignore
//! let session = CaptureSession::open(source_by_name("synthetic"), &Config::default(), host);
//! session.attach_surface(PreviewSurface::new("composer")).await?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod preview;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use backends::camera::{VideoSource, source_by_name};
pub use config::Config;
pub use errors::{AppError, AppResult, CaptureError, CaptureResult};
pub use preview::PreviewSurface;
pub use session::{
    CaptureSession, CaptureState, CloseReason, SessionHost, SessionSnapshot, UploadFile,
    UserAction,
};
