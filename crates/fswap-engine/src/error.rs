//! Engine error types.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Engine request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Invalid engine response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::ServiceUnavailable(_) | EngineError::Network(_)
        )
    }
}
