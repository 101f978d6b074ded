//! Shared data models for the face-swap service.
//!
//! This crate provides Serde-serializable types for:
//! - Run and result identifiers
//! - The job slot phase machine and its polling snapshot
//! - Detected face geometry
//! - Swap request options

pub mod face;
pub mod job;

// Re-export common types
pub use face::FaceBox;
pub use job::{JobPhase, JobSnapshot, ResultId, RunId, SwapOptions};
