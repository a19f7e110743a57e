//! Persistence layer: the durable slot for the progress record.
//!
//! [`ProgressBackend`] is the storage seam. [`JsonFileBackend`] writes the
//! record as JSON into the application data directory; [`MemoryBackend`]
//! keeps it in process for tests and embedders. [`ProgressStore`] wraps a
//! backend with load-once caching and the recovery rules for missing or
//! malformed data.

pub mod json_file;
pub mod memory;
pub mod store;

use crate::models::progress::ProgressRecord;
use crate::Result;

pub use json_file::JsonFileBackend;
pub use memory::MemoryBackend;
pub use store::ProgressStore;

/// Reads and writes the single progress record.
///
/// Implementations must be [`Send`] and [`Sync`] so writes can run on a
/// blocking worker thread via [`std::sync::Arc`].
pub trait ProgressBackend: Send + Sync {
    /// Read the stored record.
    ///
    /// Returns `Ok(None)` when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Corrupt` if stored data cannot be decoded, or
    /// `AppError::Io` if the slot cannot be read.
    fn read_record(&self) -> Result<Option<ProgressRecord>>;

    /// Replace the stored record. Must never leave a partially written record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the write does not complete.
    fn write_record(&self, record: &ProgressRecord) -> Result<()>;
}
