//! Single-slot job pipeline.
//!
//! This crate owns the only shared mutable state in the service: the
//! [`JobSlot`] that one background run at a time mutates and the HTTP
//! surface reads. [`run_swap_job`] is the background run itself.

pub mod error;
pub mod runner;
pub mod slot;

pub use error::{WorkerError, WorkerResult};
pub use runner::run_swap_job;
pub use slot::{JobSlot, ResultView, SlotBusy};
