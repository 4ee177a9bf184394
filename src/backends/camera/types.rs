// SPDX-License-Identifier: GPL-3.0-only
// Shared types for video source abstraction

//! Shared types for video sources

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Which way the camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FacingMode {
    /// Rear / world-facing camera
    #[default]
    Environment,
    /// Front / selfie camera
    User,
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::Environment => write!(f, "environment"),
            FacingMode::User => write!(f, "user"),
        }
    }
}

/// Acquisition constraints
///
/// All fields are preferences. A source may hand out a different resolution,
/// so consumers must read the real size from the frames they receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraints {
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            ideal_width: crate::constants::IDEAL_CAPTURE_WIDTH,
            ideal_height: crate::constants::IDEAL_CAPTURE_HEIGHT,
        }
    }
}

impl std::fmt::Display for Constraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} ({})",
            self.ideal_width, self.ideal_height, self.facing_mode
        )
    }
}

/// Opaque token naming one claim on a video source
///
/// Only meaningful to the source that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(u64);

impl HandleId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Pixel layout of a live frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::RGBA => 4,
            PixelFormat::RGB24 => 3,
        }
    }
}

/// A single frame from a live feed, at the feed's natural size
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Pixel rows, each `stride` bytes long (may include padding)
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Row stride in bytes
    pub stride: u32,
    /// When the frame was produced
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Tightly packed RGBA frame
    pub fn rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            format: PixelFormat::RGBA,
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// Minimum buffer length the declared geometry requires
    pub fn required_len(&self) -> usize {
        if self.height == 0 {
            return 0;
        }
        let row = self.width as usize * self.format.bytes_per_pixel();
        self.stride as usize * (self.height as usize - 1) + row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_len_with_padding() {
        let frame = CameraFrame {
            width: 2,
            height: 2,
            data: Arc::from(vec![0u8; 20]),
            format: PixelFormat::RGB24,
            stride: 8,
            captured_at: Instant::now(),
        };
        // Last row does not need its padding
        assert_eq!(frame.required_len(), 8 + 6);
    }

    #[test]
    fn test_default_constraints() {
        let constraints = Constraints::default();
        assert_eq!(constraints.facing_mode, FacingMode::Environment);
        assert_eq!((constraints.ideal_width, constraints.ideal_height), (640, 480));
    }
}
