//! Error types for forest-tracker

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for forest-tracker operations
pub type Result<T> = std::result::Result<T, ForestError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum ForestError {
    /// A dataset split is missing, unreadable, corrupt or shape-invalid
    #[error("Failed to load dataset {}: {reason}", .path.display())]
    DataLoad { path: PathBuf, reason: String },

    /// Hyperparameters violate their constraints
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Tracking error: {0}")]
    TrackingError(String),

    #[error("Notification error: {0}")]
    NotificationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ForestError {
    /// Build a `DataLoad` error for `path`
    pub fn data_load(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        ForestError::DataLoad {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// Configuration and shape problems are deterministic; a missing file
    /// or a tracking/IO hiccup may not be.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ForestError::DataLoad { .. }
                | ForestError::TrackingError(_)
                | ForestError::IoError(_)
        )
    }
}

impl From<serde_json::Error> for ForestError {
    fn from(err: serde_json::Error) -> Self {
        ForestError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ForestError {
    fn from(err: ndarray::ShapeError) -> Self {
        ForestError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
