// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for capture sessions
//!
//! This module provides command-line functionality for:
//! - Listing bundled video sources
//! - Taking a photo through a full session

use chrono::Local;
use snapfeed::backends::camera::{StillImageSource, SyntheticSource, VideoSource};
use snapfeed::storage::save_upload;
use snapfeed::{
    CaptureSession, CaptureState, CloseReason, Config, PreviewSurface, SessionHost, UploadFile,
    source_by_name,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Host that keeps the handed-off photo for the CLI to save
#[derive(Default)]
struct CliHost {
    upload: Mutex<Option<UploadFile>>,
    closed: Mutex<Option<CloseReason>>,
}

impl CliHost {
    fn take_upload(&self) -> Option<UploadFile> {
        self.upload
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn close_reason(&self) -> Option<CloseReason> {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionHost for CliHost {
    fn on_artifact_ready(&self, upload: UploadFile) {
        *self.upload.lock().unwrap_or_else(PoisonError::into_inner) = Some(upload);
    }

    fn on_closed(&self, reason: CloseReason) {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason);
    }
}

/// List the bundled video sources
pub fn list_sources() -> Result<(), Box<dyn std::error::Error>> {
    let synthetic = SyntheticSource::new();
    let (width, height) = synthetic.resolution();

    println!("Available sources:");
    println!();
    println!("  [synthetic] {}", synthetic.name());
    println!("      Formats: {}x{}", width, height);
    println!();
    println!("  [<path>]    {}", StillImageSource::new("<path>").name());
    println!("      Formats: native size of the image (JPEG, PNG)");
    println!();

    Ok(())
}

/// Run a capture session to completion and save the photo
pub fn take_photo(
    source: &str,
    output: Option<PathBuf>,
    retakes: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let output_dir = output.unwrap_or_else(|| config.photo_directory());

    let source = source_by_name(source);
    println!("Using source: {}", source.name());

    let runtime = tokio::runtime::Runtime::new()?;
    let path = runtime.block_on(photo_into(source, &config, &output_dir, retakes))?;
    println!(
        "Saved {} at {}",
        path.display(),
        Local::now().format("%H:%M:%S")
    );

    Ok(())
}

/// Take a photo (after `retakes` discarded ones) and save it into `output_dir`
async fn photo_into(
    source: Arc<dyn VideoSource>,
    config: &Config,
    output_dir: &Path,
    retakes: u32,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let host = Arc::new(CliHost::default());
    let upload = match run_session(source, config, host.clone(), retakes).await? {
        Some(upload) => upload,
        None => {
            let reason = host
                .close_reason()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            return Err(format!("Session closed without a photo ({})", reason).into());
        }
    };

    let path = save_upload(&upload, output_dir)?;
    println!("Wrote {} bytes", upload.bytes.len());
    Ok(path)
}

async fn run_session(
    source: Arc<dyn VideoSource>,
    config: &Config,
    host: Arc<CliHost>,
    retakes: u32,
) -> Result<Option<UploadFile>, Box<dyn std::error::Error>> {
    let session = CaptureSession::open(source, config, host.clone());
    let surface = PreviewSurface::new("cli");
    session.attach_surface(surface.clone()).await?;

    for attempt in 0..=retakes {
        let live = session
            .wait_for(|s| matches!(s.state, CaptureState::Live | CaptureState::Error) && !s.busy)
            .await?;
        if live.state == CaptureState::Error {
            let detail = live.error_detail.unwrap_or_default();
            session.cancel().await?;
            return Err(format!("Camera failed: {}", detail).into());
        }

        println!("Capturing...");
        session.capture().await?;
        let captured = session
            .wait_for(|s| matches!(s.state, CaptureState::Captured | CaptureState::Error))
            .await?;

        match (captured.state, captured.artifact) {
            (CaptureState::Captured, Some(artifact)) => {
                println!(
                    "Captured {}x{} ({} frames previewed)",
                    artifact.width,
                    artifact.height,
                    surface.frames_presented()
                );
            }
            _ => {
                let detail = captured.error_detail.unwrap_or_default();
                session.cancel().await?;
                return Err(format!("Capture failed: {}", detail).into());
            }
        }

        if attempt < retakes {
            println!("Retaking ({}/{})", attempt + 1, retakes);
            session.retake().await?;
        }
    }

    session.use_photo().await?;
    session.wait_for_state(CaptureState::Closed).await?;
    Ok(host.take_upload())
}
