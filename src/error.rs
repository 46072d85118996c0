//! Error types for Synheart Voice

use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Insufficient frames for extraction: {0}")]
    InsufficientFrames(String),
}

impl ComputeError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ComputeError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field for `InvalidInput`, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            ComputeError::InvalidInput { field, .. } => Some(field),
            _ => None,
        }
    }
}
