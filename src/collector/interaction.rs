//! Boundary to the browser-automation layer.

use crate::model::InteractionStepKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Performs UI interactions on the visited page.
///
/// Implemented by the automation layer. The collector calls it once per
/// scheduled step and never waits on it before firing the next step.
#[async_trait]
pub trait Interactor: Send + Sync + 'static {
    /// Perform `step` on the page.
    ///
    /// # Returns
    ///
    /// - `Ok(())` once the action was dispatched
    /// - `Err(InteractionError::NotFound)` if the expected control is missing
    /// - `Err(InteractionError::Failed)` for any other automation failure
    async fn perform_interaction(&self, step: InteractionStepKind) -> Result<(), InteractionError>;
}

/// Why an interaction could not be performed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error("control for {step} not found on page")]
    NotFound { step: InteractionStepKind },

    #[error("interaction {step} failed: {message}")]
    Failed {
        step: InteractionStepKind,
        message: String,
    },
}

/// A network response observed while the page was automated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedResponse {
    pub url: String,
    pub status_code: u16,
    pub body: String,
}

impl CapturedResponse {
    pub fn new(url: impl Into<String>, status_code: u16, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status_code,
            body: body.into(),
        }
    }
}
