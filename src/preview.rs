// SPDX-License-Identifier: GPL-3.0-only

//! Preview surface
//!
//! A [`PreviewSurface`] is the sink a live feed is rendered into. The host
//! creates one when its preview widget mounts and hands it to the session with
//! `CaptureSession::attach_surface`; that call is the only readiness signal
//! the session waits on.

use crate::backends::camera::{CameraFrame, HandleId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Default)]
struct SurfaceState {
    /// Feed currently playing on this surface
    playing: Option<HandleId>,
    last_frame: Option<CameraFrame>,
    frames_presented: u64,
}

struct SurfaceInner {
    id: u64,
    label: String,
    state: Mutex<SurfaceState>,
}

/// Renderable sink for a live feed (cheap to clone, clones share state)
#[derive(Clone)]
pub struct PreviewSurface {
    inner: Arc<SurfaceInner>,
}

impl PreviewSurface {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SurfaceInner {
                id: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
                label: label.into(),
                state: Mutex::new(SurfaceState::default()),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SurfaceState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start showing the feed of `handle`, beginning with `first_frame`
    pub fn start_playback(&self, handle: HandleId, first_frame: CameraFrame) {
        debug!(surface = self.id(), %handle, "Preview playback started");
        let mut state = self.state();
        state.playing = Some(handle);
        state.last_frame = Some(first_frame);
        state.frames_presented += 1;
    }

    /// Stop showing the feed of `handle`; other feeds are left alone
    pub fn stop_playback(&self, handle: HandleId) {
        let mut state = self.state();
        if state.playing == Some(handle) {
            debug!(surface = self.id(), %handle, "Preview playback stopped");
            state.playing = None;
        }
    }

    /// Show a new frame of the playing feed
    pub fn present(&self, frame: CameraFrame) {
        let mut state = self.state();
        if state.playing.is_some() {
            state.last_frame = Some(frame);
            state.frames_presented += 1;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state().playing.is_some()
    }

    /// Handle of the feed currently playing, if any
    pub fn playing_handle(&self) -> Option<HandleId> {
        self.state().playing
    }

    pub fn last_frame(&self) -> Option<CameraFrame> {
        self.state().last_frame.clone()
    }

    pub fn frames_presented(&self) -> u64 {
        self.state().frames_presented
    }
}

impl PartialEq for PreviewSurface {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl std::fmt::Debug for PreviewSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSurface")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("playing", &self.is_playing())
            .finish()
    }
}
