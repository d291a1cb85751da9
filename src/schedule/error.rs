//! Error types for delay configuration.

use thiserror::Error;

/// Invalid delay configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DelayError {
    #[error("invalid delay bounds: max {max_ms}ms is below min {min_ms}ms")]
    InvalidBounds { min_ms: u64, max_ms: u64 },
}
