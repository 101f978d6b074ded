//! Application state.

use std::sync::Arc;

use fswap_engine::FaceEngine;
use fswap_notify::Notifier;
use fswap_worker::JobSlot;

use crate::config::ApiConfig;

/// Shared application state.
///
/// The engine and notifier are injected so the whole surface can be
/// exercised with fakes; the slot is the process-wide single job slot.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub slot: Arc<JobSlot>,
    pub engine: Arc<dyn FaceEngine>,
    /// `None` when SMTP is not configured; `/send_email` reports an
    /// error in that case.
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        config: ApiConfig,
        engine: Arc<dyn FaceEngine>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            config,
            slot: Arc::new(JobSlot::new()),
            engine,
            notifier,
        }
    }
}
