// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic test-pattern camera
//!
//! Behaves like a single exclusive device: while one claim is held, further
//! `acquire` calls fail with `DeviceUnavailable`. Frames are a colour
//! gradient with a bar that moves one step per grabbed frame.

use super::types::{CameraFrame, Constraints, HandleId};
use super::VideoSource;
use crate::errors::{CaptureError, CaptureResult};
use crate::preview::PreviewSurface;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const BAR_WIDTH: u32 = 16;

#[derive(Debug, Default)]
struct SyntheticState {
    next_handle: u64,
    claimed: Option<HandleId>,
    frame_counter: u64,
}

/// Test-pattern video source
pub struct SyntheticSource {
    width: u32,
    height: u32,
    state: Mutex<SyntheticState>,
}

impl SyntheticSource {
    /// 640x480 pattern
    pub fn new() -> Self {
        Self::with_resolution(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    /// Pattern at a fixed native resolution, whatever the constraints ask for
    pub fn with_resolution(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: Mutex::new(SyntheticState {
                next_handle: 1,
                ..Default::default()
            }),
        }
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether a claim is currently outstanding
    pub fn is_claimed(&self) -> bool {
        self.state().claimed.is_some()
    }

    fn state(&self) -> MutexGuard<'_, SyntheticState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_claim(&self, handle: HandleId) -> CaptureResult<()> {
        if self.state().claimed == Some(handle) {
            Ok(())
        } else {
            Err(CaptureError::PlaybackFailed(format!(
                "handle {} is not active",
                handle
            )))
        }
    }

    fn render(&self, frame_index: u64) -> CameraFrame {
        let (width, height) = (self.width, self.height);
        let bar_x = ((frame_index * BAR_WIDTH as u64) % width.max(1) as u64) as u32;
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);

        for y in 0..height {
            for x in 0..width {
                if x >= bar_x && x < bar_x + BAR_WIDTH {
                    data.extend_from_slice(&[255, 255, 255, 255]);
                } else {
                    let r = (x * 255 / width.max(1)) as u8;
                    let g = (y * 255 / height.max(1)) as u8;
                    data.extend_from_slice(&[r, g, 128, 255]);
                }
            }
        }

        CameraFrame::rgba(width, height, data)
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoSource for SyntheticSource {
    fn name(&self) -> &str {
        "Synthetic test pattern"
    }

    async fn acquire(&self, constraints: &Constraints) -> CaptureResult<HandleId> {
        let mut state = self.state();
        if let Some(holder) = state.claimed {
            return Err(CaptureError::DeviceUnavailable(format!(
                "device is busy (held by {})",
                holder
            )));
        }

        let handle = HandleId::new(state.next_handle);
        state.next_handle += 1;
        state.claimed = Some(handle);

        info!(
            %handle,
            requested = %constraints,
            width = self.width,
            height = self.height,
            "Synthetic camera acquired"
        );
        Ok(handle)
    }

    async fn attach(&self, handle: HandleId, surface: &PreviewSurface) -> CaptureResult<()> {
        self.check_claim(handle)?;
        let frame_index = {
            let mut state = self.state();
            state.frame_counter += 1;
            state.frame_counter
        };
        surface.start_playback(handle, self.render(frame_index));
        Ok(())
    }

    async fn grab_frame(
        &self,
        handle: HandleId,
        surface: &PreviewSurface,
    ) -> CaptureResult<CameraFrame> {
        self.check_claim(handle)
            .map_err(|e| CaptureError::EncodeFailed(e.to_string()))?;
        let frame_index = {
            let mut state = self.state();
            state.frame_counter += 1;
            state.frame_counter
        };
        let frame = self.render(frame_index);
        surface.present(frame.clone());
        Ok(frame)
    }

    fn release(&self, handle: HandleId) {
        let mut state = self.state();
        if state.claimed == Some(handle) {
            state.claimed = None;
            debug!(%handle, "Synthetic camera released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exclusive_claim() {
        let source = SyntheticSource::new();
        let first = source.acquire(&Constraints::default()).await.unwrap();

        let second = source.acquire(&Constraints::default()).await;
        assert!(matches!(second, Err(CaptureError::DeviceUnavailable(_))));

        source.release(first);
        source.release(first);
        assert!(!source.is_claimed());
        assert!(source.acquire(&Constraints::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_native_resolution_wins_over_constraints() {
        let source = SyntheticSource::with_resolution(320, 240);
        let surface = PreviewSurface::new("test");
        let handle = source.acquire(&Constraints::default()).await.unwrap();
        source.attach(handle, &surface).await.unwrap();

        let frame = source.grab_frame(handle, &surface).await.unwrap();
        assert_eq!((frame.width, frame.height), (320, 240));
        assert_eq!(frame.data.len(), 320 * 240 * 4);
    }

    #[tokio::test]
    async fn test_attach_after_release_fails() {
        let source = SyntheticSource::new();
        let surface = PreviewSurface::new("test");
        let handle = source.acquire(&Constraints::default()).await.unwrap();
        source.release(handle);

        let result = source.attach(handle, &surface).await;
        assert!(matches!(result, Err(CaptureError::PlaybackFailed(_))));
        assert!(!surface.is_playing());
    }
}
