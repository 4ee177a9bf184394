// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the photo pipeline and bundled sources

mod common;

use common::{ScriptedSource, open, settle};
use image::{Rgb, RgbImage};
use snapfeed::backends::camera::{Constraints, StillImageSource, SyntheticSource, VideoSource};
use snapfeed::pipelines::photo::{EncodingQuality, FrameCapturer};
use snapfeed::storage::save_upload;
use snapfeed::{CaptureError, CaptureState, PreviewSurface};
use std::sync::Arc;

#[tokio::test]
async fn test_capturer_encodes_synthetic_frame() {
    let source = SyntheticSource::with_resolution(160, 120);
    let surface = PreviewSurface::new("test");
    let handle = source.acquire(&Constraints::default()).await.unwrap();
    source.attach(handle, &surface).await.unwrap();

    let artifact = FrameCapturer::new(EncodingQuality::High)
        .capture(&source, handle, Some(&surface))
        .await
        .unwrap();

    assert_eq!((artifact.width, artifact.height), (160, 120));
    let decoded = image::load_from_memory(&artifact.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (160, 120));
    source.release(handle);
}

#[tokio::test]
async fn test_capturer_without_surface_skips_source() {
    let source = ScriptedSource::new();
    let handle = source.acquire(&Constraints::default()).await.unwrap();

    let result = FrameCapturer::default()
        .capture(source.as_ref(), handle, None)
        .await;

    assert_eq!(result, Err(CaptureError::SurfaceMissing));
    assert_eq!(source.grab_calls(), 0);
}

#[tokio::test]
async fn test_still_image_session_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let image_path = tmp.path().join("scene.png");
    RgbImage::from_pixel(48, 32, Rgb([200, 40, 40]))
        .save(&image_path)
        .unwrap();

    let source: Arc<dyn VideoSource> = Arc::new(StillImageSource::new(&image_path));
    let (session, host) = open(source);
    session.attach_surface(PreviewSurface::new("x")).await.unwrap();
    settle(&session, CaptureState::Live).await;

    session.capture().await.unwrap();
    let artifact = settle(&session, CaptureState::Captured)
        .await
        .artifact
        .unwrap();
    assert_eq!((artifact.width, artifact.height), (48, 32));

    // Solid red survives JPEG within tolerance
    let decoded = image::load_from_memory(&artifact.bytes).unwrap().to_rgb8();
    let Rgb([r, g, b]) = *decoded.get_pixel(24, 16);
    assert!(r > 170 && g < 80 && b < 80, "unexpected colour {:?}", (r, g, b));

    session.use_photo().await.unwrap();
    let upload = host.uploads().pop().unwrap();

    let out_dir = tmp.path().join("out");
    let saved = save_upload(&upload, &out_dir).unwrap();
    assert_eq!(saved.file_name().unwrap().to_str().unwrap(), upload.filename);
    assert_eq!(std::fs::read(&saved).unwrap(), upload.bytes.to_vec());
}

#[tokio::test]
async fn test_missing_image_session_fails_unavailable() {
    let tmp = tempfile::tempdir().unwrap();
    let source: Arc<dyn VideoSource> =
        Arc::new(StillImageSource::new(tmp.path().join("nope.png")));
    let (session, _host) = open(source);

    let failed = settle(&session, CaptureState::Error).await;
    assert!(failed.error_detail.unwrap().contains("unavailable"));
}
