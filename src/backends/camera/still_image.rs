// SPDX-License-Identifier: GPL-3.0-only

//! Still image video source
//!
//! Serves a decoded image file as the live feed, which is handy for demos and
//! for hosts without a camera. The file is decoded on every acquisition so a
//! retake picks up changes on disk.

use super::types::{CameraFrame, Constraints, HandleId};
use super::VideoSource;
use crate::errors::{CaptureError, CaptureResult};
use crate::preview::PreviewSurface;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct StillState {
    next_handle: u64,
    /// Active claim and the frame decoded for it
    claimed: Option<(HandleId, CameraFrame)>,
}

/// Video source backed by an image file
pub struct StillImageSource {
    path: PathBuf,
    name: String,
    state: Mutex<StillState>,
}

impl StillImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            path,
            state: Mutex::new(StillState {
                next_handle: 1,
                claimed: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, StillState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn active_frame(&self, handle: HandleId) -> Option<CameraFrame> {
        match &self.state().claimed {
            Some((active, frame)) if *active == handle => Some(frame.clone()),
            _ => None,
        }
    }
}

/// Decode an image file into an RGBA frame
pub fn load_image_as_frame(path: &Path) -> CaptureResult<CameraFrame> {
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => {
            CaptureError::DeviceUnavailable(format!("{}: {}", path.display(), io))
        }
        other => CaptureError::Unsupported(format!("{}: {}", path.display(), other)),
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    debug!(width, height, "Image loaded successfully");

    Ok(CameraFrame::rgba(width, height, rgba.into_raw()))
}

#[async_trait]
impl VideoSource for StillImageSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn acquire(&self, constraints: &Constraints) -> CaptureResult<HandleId> {
        let holder = self.state().claimed.as_ref().map(|(active, _)| *active);
        if let Some(holder) = holder {
            return Err(CaptureError::DeviceUnavailable(format!(
                "{} is busy (held by {})",
                self.name, holder
            )));
        }

        let path = self.path.clone();
        let frame = tokio::task::spawn_blocking(move || load_image_as_frame(&path))
            .await
            .map_err(|e| CaptureError::DeviceUnavailable(format!("image loader failed: {}", e)))??;

        let mut state = self.state();
        if state.claimed.is_some() {
            return Err(CaptureError::DeviceUnavailable(format!(
                "{} was claimed during loading",
                self.name
            )));
        }
        let handle = HandleId::new(state.next_handle);
        state.next_handle += 1;
        info!(
            %handle,
            requested = %constraints,
            width = frame.width,
            height = frame.height,
            "Still image source acquired"
        );
        state.claimed = Some((handle, frame));
        Ok(handle)
    }

    async fn attach(&self, handle: HandleId, surface: &PreviewSurface) -> CaptureResult<()> {
        let frame = self.active_frame(handle).ok_or_else(|| {
            CaptureError::PlaybackFailed(format!("handle {} is not active", handle))
        })?;
        surface.start_playback(handle, frame);
        Ok(())
    }

    async fn grab_frame(
        &self,
        handle: HandleId,
        _surface: &PreviewSurface,
    ) -> CaptureResult<CameraFrame> {
        self.active_frame(handle)
            .ok_or_else(|| CaptureError::EncodeFailed(format!("handle {} is not active", handle)))
    }

    fn release(&self, handle: HandleId) {
        let mut state = self.state();
        if matches!(&state.claimed, Some((active, _)) if *active == handle) {
            state.claimed = None;
            debug!(%handle, "Still image source released");
        }
    }
}
