// SPDX-License-Identifier: GPL-3.0-only

//! Video source abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   CaptureSession    │  ← State machine, owns at most one DeviceHandle
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  VideoSource Trait  │  ← acquire / attach / grab_frame / release
//! └──────────┬──────────┘
//!            │
//!       ┌────┴──────┐
//!       ▼           ▼
//!  ┌─────────┐ ┌───────────┐
//!  │Synthetic│ │StillImage │  ← Bundled implementations
//!  └─────────┘ └───────────┘
//! ```
//!
//! A claim on a source is represented by a [`DeviceHandle`], which releases
//! the claim when dropped. Every path that loses track of a handle (an early
//! return, a dropped channel message, a panic) therefore still frees the device.

pub mod still_image;
pub mod synthetic;
pub mod types;

pub use still_image::StillImageSource;
pub use synthetic::SyntheticSource;
pub use types::*;

use crate::errors::CaptureResult;
use crate::preview::PreviewSurface;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// A camera-like capability that yields a live feed
///
/// Implementations must treat `release` as idempotent: releasing an unknown
/// or already-released handle is a no-op.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Human-readable source name for logs and listings
    fn name(&self) -> &str;

    /// Claim the device
    ///
    /// Fails with `Unsupported` when the capability is absent, or with
    /// `PermissionDenied` / `DeviceUnavailable` when the claim is refused.
    async fn acquire(&self, constraints: &Constraints) -> CaptureResult<HandleId>;

    /// Route the claimed feed to a preview surface and start playback
    ///
    /// Fails with `PlaybackFailed`.
    async fn attach(&self, handle: HandleId, surface: &PreviewSurface) -> CaptureResult<()>;

    /// Grab the current frame of a playing feed at its natural size
    async fn grab_frame(&self, handle: HandleId, surface: &PreviewSurface)
    -> CaptureResult<CameraFrame>;

    /// Give the device back
    fn release(&self, handle: HandleId);
}

/// Exclusive ownership of one acquired video source claim
///
/// Releases the claim exactly once, either through [`DeviceHandle::release`]
/// or on drop.
pub struct DeviceHandle {
    id: HandleId,
    source: Arc<dyn VideoSource>,
    released: bool,
}

impl DeviceHandle {
    /// Take ownership of a claim issued by `source`
    pub fn new(id: HandleId, source: Arc<dyn VideoSource>) -> Self {
        Self {
            id,
            source,
            released: false,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Release the claim now
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        debug!(handle = %self.id, source = self.source.name(), "Releasing video source");
        self.source.release(self.id);
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl std::fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("id", &self.id)
            .field("source", &self.source.name())
            .field("released", &self.released)
            .finish()
    }
}

/// Acquire a claim and wrap it in a [`DeviceHandle`] straight away
pub async fn acquire_handle(
    source: &Arc<dyn VideoSource>,
    constraints: &Constraints,
) -> CaptureResult<DeviceHandle> {
    let id = source.acquire(constraints).await?;
    Ok(DeviceHandle::new(id, Arc::clone(source)))
}

/// Build a bundled source by name: `synthetic` or an image path
pub fn source_by_name(name: &str) -> Arc<dyn VideoSource> {
    if name.eq_ignore_ascii_case("synthetic") {
        Arc::new(SyntheticSource::new())
    } else {
        Arc::new(StillImageSource::new(name))
    }
}
