// SPDX-License-Identifier: GPL-3.0-only

//! Async JPEG encoding
//!
//! Encoding is CPU-bound, so it runs on the blocking pool and the session
//! task stays responsive while a photo is being compressed.

use crate::errors::{CaptureError, CaptureResult};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced, the default for feed uploads)
    #[default]
    Medium,
    /// High quality (low compression)
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

/// Encoded image data
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// JPEG encoder
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    quality: EncodingQuality,
}

impl PhotoEncoder {
    pub fn new(quality: EncodingQuality) -> Self {
        Self { quality }
    }

    pub fn quality(&self) -> EncodingQuality {
        self.quality
    }

    /// Encode a raster asynchronously
    ///
    /// Fails with `EncodeFailed` if the encoder errors or produces no data.
    pub async fn encode(&self, image: RgbImage) -> CaptureResult<EncodedImage> {
        let (width, height) = image.dimensions();
        info!(width, height, quality = ?self.quality, "Starting encoding");

        let quality = self.quality;
        let encoded = tokio::task::spawn_blocking(move || {
            let data = Self::encode_jpeg(&image, quality)?;
            debug!(size = data.len(), "Encoding complete");
            Ok::<_, CaptureError>(EncodedImage {
                data,
                width,
                height,
            })
        })
        .await
        .map_err(|e| CaptureError::EncodeFailed(format!("encoding task error: {}", e)))??;

        if encoded.data.is_empty() {
            return Err(CaptureError::EncodeFailed(
                "encoder produced no data".to_string(),
            ));
        }
        Ok(encoded)
    }

    /// Encode image as JPEG
    fn encode_jpeg(image: &RgbImage, quality: EncodingQuality) -> CaptureResult<Vec<u8>> {
        let mut buffer = Vec::new();
        {
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut buffer,
                quality.jpeg_quality(),
            );
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )?;
        }

        Ok(buffer)
    }
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new(EncodingQuality::default())
    }
}
