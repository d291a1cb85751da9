//! Error types for chart ingestion.

use crate::repository::RepositoryError;
use thiserror::Error;

/// Errors returned by [`ChartIngestionService`](super::ChartIngestionService).
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A slot payload that could not be parsed at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("malformed chart payload: {0}")]
    Malformed(String),
}
