// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON under `$XDG_CONFIG_HOME/snapfeed/config.json`. Every field
//! has a default, so a missing file or a partial file both load cleanly.

use crate::backends::camera::{Constraints, FacingMode};
use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, IDEAL_CAPTURE_HEIGHT, IDEAL_CAPTURE_WIDTH,
};
use crate::errors::{AppError, AppResult};
use crate::pipelines::photo::EncodingQuality;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which way the requested camera should face
    pub facing_mode: FacingMode,
    /// Requested capture width (the device may deliver another size)
    pub ideal_width: u32,
    /// Requested capture height (the device may deliver another size)
    pub ideal_height: u32,
    /// JPEG quality preset for captured photos
    pub jpeg_quality: EncodingQuality,
    /// Where the CLI saves photos; `None` means `~/Pictures/snapfeed`
    pub photo_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment, // Rear camera, as for snapping a scene
            ideal_width: IDEAL_CAPTURE_WIDTH,
            ideal_height: IDEAL_CAPTURE_HEIGHT,
            jpeg_quality: EncodingQuality::Medium,
            photo_dir: None,
        }
    }
}

impl Config {
    /// Default config file location, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory on this platform, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(AppError::Config(format!("{}: {}", path.display(), e))),
        };

        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write to a specific file, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Acquisition constraints every session attempt uses (open, retake, retry)
    pub fn constraints(&self) -> Constraints {
        Constraints {
            facing_mode: self.facing_mode,
            ideal_width: self.ideal_width,
            ideal_height: self.ideal_height,
        }
    }

    /// Directory the CLI saves photos into
    pub fn photo_directory(&self) -> PathBuf {
        self.photo_dir.clone().unwrap_or_else(|| {
            dirs::picture_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR_NAME)
        })
    }
}
