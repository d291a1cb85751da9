//! Error types for the collector.

use crate::model::InstrumentId;
use thiserror::Error;

/// Errors returned by [`Collector`](super::Collector) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectorError {
    /// `begin_collection` called while a previous visit is still running
    #[error("collection for {instrument} is still in progress")]
    CollectionInProgress { instrument: InstrumentId },

    /// The collector was dropped before the visit completed
    #[error("collection for {instrument} was abandoned before completing")]
    Abandoned { instrument: InstrumentId },
}
