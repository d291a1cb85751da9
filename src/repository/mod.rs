//! History persistence.
//!
//! Ingestion writes through the [`HistoryRepository`] trait. Two
//! implementations ship with the crate: an in-memory store and a JSON file
//! store built on top of it.

mod error;
mod file;
mod memory;

pub use error::*;
pub use file::JsonFileHistoryRepository;
pub use memory::InMemoryHistoryRepository;

use crate::model::HistoryRecord;
use async_trait::async_trait;

/// Storage for history records keyed by (instrument, date).
///
/// Added records become durable on [`save_changes`](Self::save_changes);
/// one add-then-save pair is one logical unit of work.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Stage `records`, skipping any whose key is already stored or staged.
    ///
    /// Returns how many records were staged.
    async fn add_records_if_absent(
        &self,
        records: Vec<HistoryRecord>,
    ) -> Result<usize, RepositoryError>;

    /// Commit staged records.
    async fn save_changes(&self) -> Result<(), RepositoryError>;
}
