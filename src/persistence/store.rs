//! Cached access to the progress record.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::{JsonFileBackend, ProgressBackend};
use crate::config::GameConfig;
use crate::models::progress::ProgressRecord;
use crate::{AppError, Result};

/// Progress record loaded once and kept in memory, backed by a durable slot.
///
/// Loading never fails: a missing record is a first run, and a malformed or
/// unreadable one falls back to the default. Writes report their failures to
/// the caller.
#[derive(Clone)]
pub struct ProgressStore {
    backend: Arc<dyn ProgressBackend>,
    cached: ProgressRecord,
}

impl ProgressStore {
    /// Wrap `backend` and load the current record into the cache.
    #[must_use]
    pub fn new(backend: Arc<dyn ProgressBackend>) -> Self {
        let mut store = Self {
            backend,
            cached: ProgressRecord::default(),
        };
        store.load();
        store
    }

    /// Store backed by the JSON file at the configured save path.
    #[must_use]
    pub fn open(config: &GameConfig) -> Self {
        Self::new(Arc::new(JsonFileBackend::from_config(config)))
    }

    /// Read the persisted record and refresh the cache.
    pub fn load(&mut self) -> ProgressRecord {
        self.cached = match self.backend.read_record() {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!("no progress record found, starting fresh");
                ProgressRecord::default()
            }
            Err(err) => {
                warn!(%err, "progress record unusable, falling back to defaults");
                ProgressRecord::default()
            }
        };
        self.cached
    }

    /// Overwrite the record with `level`.
    ///
    /// The cache only changes when the write succeeds.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the backend write fails.
    pub fn save(&mut self, level: u32) -> Result<()> {
        let record = ProgressRecord::new(level);
        let outcome = self.backend.write_record(&record);
        self.commit(record, outcome)
    }

    /// Overwrite the record with `level` on a blocking worker thread and wait
    /// for the write to complete.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the write fails or the worker task
    /// panics.
    pub async fn save_in_background(&mut self, level: u32) -> Result<()> {
        let record = ProgressRecord::new(level);
        let backend = Arc::clone(&self.backend);

        let outcome = match tokio::task::spawn_blocking(move || backend.write_record(&record)).await {
            Ok(written) => written,
            Err(err) => Err(AppError::Persistence(format!(
                "progress write task failed: {err}"
            ))),
        };

        self.commit(record, outcome)
    }

    /// Write a zeroed record and reload the cache from storage.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the zeroed record cannot be
    /// written; the cache is left untouched in that case.
    pub fn reset(&mut self) -> Result<()> {
        self.save(0)?;
        self.load();
        info!("progress reset");
        Ok(())
    }

    /// Cached record.
    #[must_use]
    pub fn record(&self) -> ProgressRecord {
        self.cached
    }

    /// Cached last finished level.
    #[must_use]
    pub fn last_finished_level(&self) -> u32 {
        self.cached.last_finished_level
    }

    fn commit(&mut self, record: ProgressRecord, outcome: Result<()>) -> Result<()> {
        match outcome {
            Ok(()) => {
                self.cached = record;
                info!(level = record.last_finished_level, "progress saved");
                Ok(())
            }
            Err(err) => {
                error!(%err, level = record.last_finished_level, "progress save failed");
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("cached", &self.cached)
            .finish_non_exhaustive()
    }
}
