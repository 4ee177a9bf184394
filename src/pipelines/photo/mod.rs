// SPDX-License-Identifier: GPL-3.0-only

//! Photo capture pipeline
//!
//! ```text
//! VideoSource → grab frame → rasterize → JPEG encode → Artifact
//! ```
//!
//! # Pipeline Stages
//!
//! 1. **Capture**: Grab the current frame of a playing feed at its natural size
//! 2. **Rasterize**: Copy it into an RGB raster of exactly that size
//! 3. **Encoding**: Compress to JPEG on the blocking pool

pub mod capture;
pub mod encoding;

pub use capture::FrameCapturer;
pub use encoding::{EncodedImage, EncodingQuality, PhotoEncoder};

use crate::constants::ARTIFACT_MIME_TYPE;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A captured still
///
/// The bytes are shared, so cloning an artifact (or handing it off) never
/// copies or re-encodes the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Arc<[u8]>,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
}

impl Artifact {
    /// Wrap freshly encoded JPEG bytes, stamped with the current time
    pub fn jpeg(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            bytes: Arc::from(data.into_boxed_slice()),
            mime_type: ARTIFACT_MIME_TYPE,
            width,
            height,
            captured_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
