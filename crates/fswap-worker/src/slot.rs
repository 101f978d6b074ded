//! The single job slot.
//!
//! Exactly one [`JobSlot`] exists per process. Every read and write goes
//! through the internal mutex, and every mutation is keyed by the
//! [`RunId`] handed out at admission, so a runner that has been
//! superseded cannot clobber the slot.

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

use fswap_models::{JobPhase, JobSnapshot, ResultId, RunId};

/// A run was submitted while another run is in flight.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("A job is already running")]
pub struct SlotBusy;

/// What the result surface sees when it asks for the current result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultView {
    /// Never ran, or the last run failed.
    NotFound,
    /// A run is in flight.
    Processing,
    /// The last run completed; the encoded result and its identifier.
    Ready { jpeg: Vec<u8>, result_id: ResultId },
}

#[derive(Debug, Default)]
struct SlotInner {
    phase: JobPhase,
    progress: u8,
    run_id: Option<RunId>,
    result: Option<Vec<u8>>,
    result_id: Option<ResultId>,
    error: Option<String>,
}

impl SlotInner {
    /// Whether `run` is the run currently executing against the slot.
    fn owned_by(&self, run: &RunId) -> bool {
        self.phase.is_running() && self.run_id.as_ref() == Some(run)
    }
}

/// Mutex-guarded single-slot job state.
#[derive(Debug, Default)]
pub struct JobSlot {
    inner: Mutex<SlotInner>,
}

impl JobSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a new run.
    ///
    /// Rejects with [`SlotBusy`] while a run is in flight. On admission
    /// the slot is reset: progress 0, result and result id cleared (the
    /// previous result becomes unavailable the moment a new run starts),
    /// and a fresh run id is issued to the caller.
    pub async fn begin_run(&self) -> Result<RunId, SlotBusy> {
        let mut inner = self.inner.lock().await;
        if inner.phase.is_running() {
            return Err(SlotBusy);
        }

        let run_id = RunId::new();
        inner.phase = JobPhase::Running;
        inner.progress = 0;
        inner.run_id = Some(run_id.clone());
        inner.result = None;
        inner.result_id = None;
        inner.error = None;
        Ok(run_id)
    }

    /// Record progress for `run`. Clamped to [0,100] and monotonically
    /// non-decreasing within the run; ignored if `run` no longer owns
    /// the slot.
    pub async fn set_progress(&self, run: &RunId, pct: u8) {
        let mut inner = self.inner.lock().await;
        if !inner.owned_by(run) {
            warn!(%run, pct, "Progress update from a run that no longer owns the slot");
            return;
        }
        inner.progress = inner.progress.max(pct.min(100));
    }

    /// Complete `run` with the encoded result. Generates a fresh result
    /// id; ignored if `run` no longer owns the slot.
    pub async fn complete_run(&self, run: &RunId, jpeg: Vec<u8>) {
        let mut inner = self.inner.lock().await;
        if !inner.owned_by(run) {
            warn!(%run, "Completion from a run that no longer owns the slot");
            return;
        }
        inner.phase = JobPhase::Completed;
        inner.progress = 100;
        inner.result = Some(jpeg);
        inner.result_id = Some(ResultId::new());
        inner.error = None;
    }

    /// Fail `run`. Progress stays where the run left it and no result is
    /// stored; ignored if `run` no longer owns the slot.
    pub async fn fail_run(&self, run: &RunId, message: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        if !inner.owned_by(run) {
            warn!(%run, "Failure report from a run that no longer owns the slot");
            return;
        }
        inner.phase = JobPhase::Failed;
        inner.result = None;
        inner.result_id = None;
        inner.error = Some(message.into());
    }

    /// Snapshot for progress polling.
    pub async fn snapshot(&self) -> JobSnapshot {
        let inner = self.inner.lock().await;
        JobSnapshot {
            progress: inner.progress,
            processing: inner.phase.is_running(),
            error: inner.error.clone(),
        }
    }

    /// Current result as seen by the result surface.
    pub async fn result(&self) -> ResultView {
        let inner = self.inner.lock().await;
        if inner.phase.is_running() {
            return ResultView::Processing;
        }
        match (&inner.result, &inner.result_id) {
            (Some(jpeg), Some(result_id)) => ResultView::Ready {
                jpeg: jpeg.clone(),
                result_id: result_id.clone(),
            },
            _ => ResultView::NotFound,
        }
    }

    /// Fetch the result for download, only if `result_id` matches the
    /// current result.
    pub async fn download(&self, result_id: &str) -> Option<Vec<u8>> {
        let inner = self.inner.lock().await;
        match (&inner.result, &inner.result_id) {
            (Some(jpeg), Some(current)) if current.as_str() == result_id => Some(jpeg.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_slot_has_nothing() {
        let slot = JobSlot::new();
        let snap = slot.snapshot().await;
        assert_eq!(snap.progress, 0);
        assert!(!snap.processing);
        assert_eq!(slot.result().await, ResultView::NotFound);
        assert!(slot.download("anything").await.is_none());
    }

    #[tokio::test]
    async fn test_begin_run_rejects_while_running() {
        let slot = JobSlot::new();
        let _run = slot.begin_run().await.unwrap();
        assert_eq!(slot.begin_run().await, Err(SlotBusy));
    }

    #[tokio::test]
    async fn test_complete_then_download_by_id() {
        let slot = JobSlot::new();
        let run = slot.begin_run().await.unwrap();
        slot.complete_run(&run, vec![1, 2, 3]).await;

        let snap = slot.snapshot().await;
        assert_eq!(snap.progress, 100);
        assert!(!snap.processing);

        let ResultView::Ready { jpeg, result_id } = slot.result().await else {
            panic!("expected a ready result");
        };
        assert_eq!(jpeg, vec![1, 2, 3]);
        assert_eq!(slot.download(result_id.as_str()).await, Some(vec![1, 2, 3]));
        assert!(slot.download("stale-id").await.is_none());
    }

    #[tokio::test]
    async fn test_result_id_stable_across_reads() {
        let slot = JobSlot::new();
        let run = slot.begin_run().await.unwrap();
        slot.complete_run(&run, vec![9]).await;

        let first = slot.result().await;
        let second = slot.result().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_new_run_clears_previous_result() {
        let slot = JobSlot::new();
        let run = slot.begin_run().await.unwrap();
        slot.complete_run(&run, vec![1]).await;

        // Admission clears the previous result immediately, before the
        // new run produces anything.
        let _run2 = slot.begin_run().await.unwrap();
        assert_eq!(slot.result().await, ResultView::Processing);
        assert!(slot.download("any").await.is_none());
        assert_eq!(slot.snapshot().await.progress, 0);
    }

    #[tokio::test]
    async fn test_progress_monotonic_and_clamped() {
        let slot = JobSlot::new();
        let run = slot.begin_run().await.unwrap();

        slot.set_progress(&run, 45).await;
        slot.set_progress(&run, 30).await;
        assert_eq!(slot.snapshot().await.progress, 45);

        slot.set_progress(&run, 200).await;
        assert_eq!(slot.snapshot().await.progress, 100);
    }

    #[tokio::test]
    async fn test_failed_run_keeps_progress_and_surfaces_error() {
        let slot = JobSlot::new();
        let run = slot.begin_run().await.unwrap();
        slot.set_progress(&run, 45).await;
        slot.fail_run(&run, "No face detected in source image").await;

        let snap = slot.snapshot().await;
        assert!(!snap.processing);
        assert_eq!(snap.progress, 45);
        assert_eq!(
            snap.error.as_deref(),
            Some("No face detected in source image")
        );
        assert_eq!(slot.result().await, ResultView::NotFound);
    }

    #[tokio::test]
    async fn test_stale_run_cannot_mutate_slot() {
        let slot = JobSlot::new();
        let stale = slot.begin_run().await.unwrap();
        slot.fail_run(&stale, "boom").await;

        let current = slot.begin_run().await.unwrap();
        slot.set_progress(&current, 10).await;

        // The finished run's handle must be inert now.
        slot.complete_run(&stale, vec![7]).await;
        slot.set_progress(&stale, 99).await;
        slot.fail_run(&stale, "late failure").await;

        let snap = slot.snapshot().await;
        assert!(snap.processing);
        assert_eq!(snap.progress, 10);
        assert_eq!(slot.result().await, ResultView::Processing);

        slot.complete_run(&current, vec![8]).await;
        let ResultView::Ready { jpeg, .. } = slot.result().await else {
            panic!("expected a ready result");
        };
        assert_eq!(jpeg, vec![8]);
    }
}
