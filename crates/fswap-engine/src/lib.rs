//! Face pipeline collaborator interface.
//!
//! The detection, swap, and enhancement models live in an inference
//! sidecar; this crate defines the [`FaceEngine`] trait the rest of the
//! service programs against, an HTTP client implementation for the
//! sidecar, and JPEG codec helpers.

pub mod codec;
pub mod engine;
pub mod error;
pub mod http;

pub use engine::FaceEngine;
pub use error::{EngineError, EngineResult};
pub use http::{EngineConfig, HttpEngine};
