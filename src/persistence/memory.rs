//! In-process backend for tests and embedders without a file system.

use std::sync::{Arc, Mutex};

use super::ProgressBackend;
use crate::models::progress::ProgressRecord;
use crate::{AppError, Result};

#[derive(Debug, Default)]
struct Slot {
    record: Option<ProgressRecord>,
    fail_writes: bool,
    writes: usize,
}

/// Progress slot held in memory. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slot: Arc<Mutex<Slot>>,
}

impl MemoryBackend {
    /// Empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-populated with `record`.
    #[must_use]
    pub fn with_record(record: ProgressRecord) -> Self {
        let backend = Self::new();
        if let Ok(mut slot) = backend.slot.lock() {
            slot.record = Some(record);
        }
        backend
    }

    /// Make every subsequent write fail, simulating a full or read-only disk.
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.fail_writes = fail;
        }
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.slot.lock().map(|slot| slot.writes).unwrap_or_default()
    }

    /// Record currently held, bypassing any cache.
    #[must_use]
    pub fn stored(&self) -> Option<ProgressRecord> {
        self.slot.lock().ok().and_then(|slot| slot.record)
    }
}

impl ProgressBackend for MemoryBackend {
    fn read_record(&self) -> Result<Option<ProgressRecord>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| AppError::Io("memory slot mutex poisoned".into()))?;
        Ok(slot.record)
    }

    fn write_record(&self, record: &ProgressRecord) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| AppError::Persistence("memory slot mutex poisoned".into()))?;
        if slot.fail_writes {
            return Err(AppError::Persistence("simulated write failure".into()));
        }
        slot.record = Some(*record);
        slot.writes += 1;
        Ok(())
    }
}
