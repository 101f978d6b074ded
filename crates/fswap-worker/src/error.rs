//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors that can terminate a swap run.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The source image contained no detectable face.
    #[error("No face detected in source image")]
    NoFaceDetected,

    #[error("Engine error: {0}")]
    Engine(#[from] fswap_engine::EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
