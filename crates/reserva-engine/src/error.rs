use crate::pipeline::state::PipelineState;
use reserva_common::error::{DriverError, RequestError};
use thiserror::Error;

/// A fatal outcome of a pipeline step.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("Locator exhausted for '{key}': {detail}")]
    LocatorExhausted { key: String, detail: String },

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Unexpected dialog during {step}: {text}")]
    UnexpectedPopup { step: &'static str, text: String },

    #[error("Malformed request: {0}")]
    MalformedRequest(#[from] RequestError),

    #[error("Invalid pipeline transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}

impl StepError {
    pub fn exhausted(key: impl Into<String>, detail: impl Into<String>) -> Self {
        StepError::LocatorExhausted {
            key: key.into(),
            detail: detail.into(),
        }
    }

    /// Short machine-friendly kind, used in run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::LocatorExhausted { .. } => "locator_exhausted",
            StepError::Timeout(_) => "timeout",
            StepError::UnexpectedPopup { .. } => "unexpected_popup",
            StepError::MalformedRequest(_) => "malformed_request",
            StepError::InvalidTransition { .. } => "invalid_transition",
            StepError::Driver(_) => "driver",
        }
    }
}
