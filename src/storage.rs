// SPDX-License-Identifier: GPL-3.0-only

//! Storage utilities for handed-off photos

use crate::errors::AppResult;
use crate::session::UploadFile;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Write an upload into `dir` under its own filename
///
/// Creates `dir` if needed. An existing file with the same name gets a
/// numeric suffix instead of being overwritten.
pub fn save_upload(upload: &UploadFile, dir: &Path) -> AppResult<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let path = unique_path(dir, &upload.filename);
    std::fs::write(&path, &upload.bytes)?;
    info!(path = %path.display(), size = upload.bytes.len(), "Photo saved");
    Ok(path)
}

fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (filename, None),
    };
    (1u32..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{}_{}.{}", stem, n, ext)),
            None => dir.join(format!("{}_{}", stem, n)),
        })
        .find(|path| !path.exists())
        .inspect(|path| debug!(path = %path.display(), "Filename taken, using suffix"))
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn upload(name: &str, bytes: &[u8]) -> UploadFile {
        UploadFile {
            bytes: Arc::from(bytes),
            filename: name.to_string(),
            mime_type: "image/jpeg",
        }
    }

    #[test]
    fn test_save_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("photos");

        let path = save_upload(&upload("photo_1.jpg", &[1, 2, 3]), &dir).unwrap();
        assert_eq!(path, dir.join("photo_1.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_save_does_not_overwrite() {
        let tmp = tempfile::tempdir().unwrap();

        let first = save_upload(&upload("photo_1.jpg", &[1]), tmp.path()).unwrap();
        let second = save_upload(&upload("photo_1.jpg", &[2]), tmp.path()).unwrap();

        assert_ne!(first, second);
        assert_eq!(second, tmp.path().join("photo_1_1.jpg"));
        assert_eq!(std::fs::read(&first).unwrap(), vec![1]);
        assert_eq!(std::fs::read(&second).unwrap(), vec![2]);
    }
}
