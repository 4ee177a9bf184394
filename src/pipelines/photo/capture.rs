// SPDX-License-Identifier: GPL-3.0-only

//! Photo capture from a live feed
//!
//! ```text
//! live feed ─grab─▶ CameraFrame ─rasterize─▶ RgbImage (frame size) ─encode─▶ JPEG
//! ```

use super::encoding::{EncodingQuality, PhotoEncoder};
use super::Artifact;
use crate::backends::camera::{CameraFrame, HandleId, PixelFormat, VideoSource};
use crate::errors::{CaptureError, CaptureResult};
use crate::preview::PreviewSurface;
use image::RgbImage;
use tracing::{debug, info};

/// Produces a single still from a playing feed
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCapturer {
    encoder: PhotoEncoder,
}

impl FrameCapturer {
    pub fn new(quality: EncodingQuality) -> Self {
        Self {
            encoder: PhotoEncoder::new(quality),
        }
    }

    /// Capture the current frame of `handle` as a JPEG artifact
    ///
    /// Without a surface this fails with `SurfaceMissing` before the source
    /// is touched.
    pub async fn capture(
        &self,
        source: &dyn VideoSource,
        handle: HandleId,
        surface: Option<&PreviewSurface>,
    ) -> CaptureResult<Artifact> {
        let surface = surface.ok_or(CaptureError::SurfaceMissing)?;

        info!(
            %handle,
            surface = surface.id(),
            quality = ?self.encoder.quality(),
            "Capturing photo from live feed"
        );
        let frame = source.grab_frame(handle, surface).await?;
        debug!(
            width = frame.width,
            height = frame.height,
            format = ?frame.format,
            "Frame grabbed"
        );

        let raster = rasterize(&frame)?;
        let encoded = self.encoder.encode(raster).await?;
        Ok(Artifact::jpeg(encoded.data, encoded.width, encoded.height))
    }
}

/// Copy a frame into an off-screen raster sized exactly to the frame
pub fn rasterize(frame: &CameraFrame) -> CaptureResult<RgbImage> {
    if frame.width == 0 || frame.height == 0 {
        return Err(CaptureError::EncodeFailed(format!(
            "frame has no pixels ({}x{})",
            frame.width, frame.height
        )));
    }

    let bpp = frame.format.bytes_per_pixel();
    let row_len = frame.width as usize * bpp;
    if (frame.stride as usize) < row_len || frame.data.len() < frame.required_len() {
        return Err(CaptureError::EncodeFailed(format!(
            "frame buffer too small for {}x{} ({} bytes, stride {})",
            frame.width,
            frame.height,
            frame.data.len(),
            frame.stride
        )));
    }

    let mut raster = RgbImage::new(frame.width, frame.height);
    for (y, row) in raster.rows_mut().enumerate() {
        let start = y * frame.stride as usize;
        let src = &frame.data[start..start + row_len];
        for (pixel, chunk) in row.zip(src.chunks_exact(bpp)) {
            pixel.0 = match frame.format {
                PixelFormat::RGBA | PixelFormat::RGB24 => [chunk[0], chunk[1], chunk[2]],
            };
        }
    }

    Ok(raster)
}
