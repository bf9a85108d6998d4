//! Error types for the drawing pad and its classifier bridge

use thiserror::Error;

/// Result type alias for pad operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while drawing or classifying
#[derive(Error, Debug)]
pub enum Error {
    /// The classifier failed to load its parameters
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    /// Inference was requested before the readiness gate opened
    #[error("Model is not ready")]
    NotReady,

    /// The classifier failed while running a prediction
    #[error("Inference failed: {0}")]
    Inference(String),

    /// A tensor or prediction vector had the wrong number of elements
    #[error("Shape mismatch: expected {expected} elements, got {actual}")]
    Shape { expected: usize, actual: usize },

    /// A buffer handle was unknown to the classifier (already released?)
    #[error("Invalid buffer handle: {0}")]
    InvalidBuffer(u64),

    /// The out-of-process classifier misbehaved
    #[error("Worker error: {0}")]
    Worker(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
