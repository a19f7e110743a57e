//! JSON file backend with atomic replacement.
//!
//! Writes go to a temporary file in the target directory which is then
//! renamed over the record (`tempfile::NamedTempFile::persist`), so a crash
//! mid-write leaves either the old record or the new one. The directory is
//! synced after the rename so the new entry itself is durable.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::ProgressBackend;
use crate::config::GameConfig;
use crate::models::progress::ProgressRecord;
use crate::{AppError, Result};

/// Progress record stored as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Backend for the record at `path`. Nothing is touched on disk yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backend for the configured save path.
    #[must_use]
    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.save_path())
    }

    /// Location of the record file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressBackend for JsonFileBackend {
    fn read_record(&self) -> Result<Option<ProgressRecord>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(AppError::Io(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )))
            }
        };

        let record: ProgressRecord = serde_json::from_str(&raw)?;
        debug!(path = %self.path.display(), level = record.last_finished_level, "progress record read");
        Ok(Some(record))
    }

    fn write_record(&self, record: &ProgressRecord) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        fs::create_dir_all(parent).map_err(|err| {
            AppError::Persistence(format!(
                "failed to create data directory {}: {err}",
                parent.display()
            ))
        })?;

        let json = serde_json::to_vec(record)
            .map_err(|err| AppError::Persistence(format!("failed to encode record: {err}")))?;

        let mut tmp = NamedTempFile::new_in(parent)
            .map_err(|err| AppError::Persistence(format!("failed to create temporary file: {err}")))?;

        tmp.write_all(&json)
            .map_err(|err| AppError::Persistence(format!("failed to write temporary file: {err}")))?;
        tmp.as_file()
            .sync_all()
            .map_err(|err| AppError::Persistence(format!("failed to sync temporary file: {err}")))?;

        tmp.persist(&self.path).map_err(|err| {
            AppError::Persistence(format!(
                "failed to persist record to {}: {err}",
                self.path.display()
            ))
        })?;
        sync_dir(parent)?;

        debug!(path = %self.path.display(), level = record.last_finished_level, "progress record written");
        Ok(())
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)
        .and_then(|handle| handle.sync_all())
        .map_err(|err| {
            AppError::Persistence(format!(
                "failed to sync data directory {}: {err}",
                dir.display()
            ))
        })
}

// Directory handles cannot be opened for syncing here.
#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
