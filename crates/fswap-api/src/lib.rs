//! Axum HTTP API for the face-swap service.
//!
//! This crate provides:
//! - The upload gateway that admits one job at a time
//! - Progress and result polling endpoints
//! - Download and email delivery of the produced JPEG

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
