//! The swap job runner.
//!
//! One call to [`run_swap_job`] is one end-to-end run: decode both
//! inputs, detect faces, compose the swaps, enhance, and store the
//! encoded result in the slot. The caller has already admitted the run
//! via [`JobSlot::begin_run`] and spawned this on a background task.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use tracing::{info, warn};

use fswap_engine::{codec, FaceEngine};
use fswap_models::{RunId, SwapOptions};

use crate::error::{WorkerError, WorkerResult};
use crate::slot::JobSlot;

/// Share of the progress range spent on the swap loop; the remainder is
/// reported when enhancement completes.
const SWAP_PROGRESS_CEILING: u32 = 90;

/// Execute one swap run against the slot.
///
/// Results are side-effected into `slot`; the temp inputs are released
/// unconditionally, success or failure.
pub async fn run_swap_job(
    slot: Arc<JobSlot>,
    engine: Arc<dyn FaceEngine>,
    run_id: RunId,
    source_path: PathBuf,
    target_path: PathBuf,
    options: SwapOptions,
) {
    info!(%run_id, num_faces = options.num_faces, "Swap run started");

    match execute(&slot, engine.as_ref(), &run_id, &source_path, &target_path, options).await {
        Ok(jpeg) => {
            info!(%run_id, bytes = jpeg.len(), "Swap run completed");
            slot.complete_run(&run_id, jpeg).await;
        }
        Err(e) => {
            warn!(%run_id, error = %e, "Swap run failed");
            slot.fail_run(&run_id, e.to_string()).await;
        }
    }

    release_input(&source_path).await;
    release_input(&target_path).await;
}

async fn execute(
    slot: &JobSlot,
    engine: &dyn FaceEngine,
    run_id: &RunId,
    source_path: &Path,
    target_path: &Path,
    options: SwapOptions,
) -> WorkerResult<Vec<u8>> {
    let source = load_image(source_path).await?;
    let target = load_image(target_path).await?;

    let source_faces = engine.detect_faces(&source).await?;
    let Some(source_face) = source_faces.first() else {
        return Err(WorkerError::NoFaceDetected);
    };

    let target_faces = engine.detect_faces(&target).await?;
    let swap_count = (options.num_faces as usize).min(target_faces.len());
    info!(
        %run_id,
        detected = target_faces.len(),
        swapping = swap_count,
        "Target faces detected"
    );

    // Swaps compose: each swap's output is the next swap's input. With
    // zero swaps the unmodified target still goes through enhancement.
    let mut working = target.clone();
    for (i, target_face) in target_faces.iter().take(swap_count).enumerate() {
        working = engine
            .swap_face(&source, source_face, &working, target_face)
            .await?;
        let pct = ((i as u32 + 1) * SWAP_PROGRESS_CEILING / swap_count as u32) as u8;
        slot.set_progress(run_id, pct).await;
    }

    let enhanced = engine.enhance(&working).await?;
    Ok(codec::encode_jpeg(&enhanced)?)
}

async fn load_image(path: &Path) -> WorkerResult<DynamicImage> {
    let bytes = tokio::fs::read(path).await?;
    Ok(codec::decode(&bytes)?)
}

/// Delete an uploaded input. Failure is logged, never propagated: the
/// run's outcome is already decided by the time cleanup happens.
async fn release_input(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "Failed to remove uploaded input");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use image::RgbImage;
    use tempfile::TempDir;

    use fswap_engine::{EngineResult, FaceEngine};
    use fswap_models::FaceBox;

    const SOURCE_SIZE: u32 = 8;
    const TARGET_SIZE: u32 = 16;

    fn face(i: u32) -> FaceBox {
        FaceBox {
            x: i as f32 * 10.0,
            y: 0.0,
            width: 8.0,
            height: 8.0,
            score: 0.9,
        }
    }

    /// Engine fake that keys face counts off image dimensions: the
    /// source input is 8x8, the target 16x16.
    struct FakeEngine {
        source_faces: usize,
        target_faces: usize,
        delay: Option<Duration>,
        fail_enhance: bool,
        swap_calls: AtomicUsize,
        enhance_calls: AtomicUsize,
    }

    impl FakeEngine {
        fn new(source_faces: usize, target_faces: usize) -> Self {
            Self {
                source_faces,
                target_faces,
                delay: None,
                fail_enhance: false,
                swap_calls: AtomicUsize::new(0),
                enhance_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl FaceEngine for FakeEngine {
        async fn detect_faces(&self, img: &DynamicImage) -> EngineResult<Vec<FaceBox>> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let count = if img.width() == SOURCE_SIZE {
                self.source_faces
            } else {
                self.target_faces
            };
            Ok((0..count as u32).map(face).collect())
        }

        async fn swap_face(
            &self,
            _source: &DynamicImage,
            _source_face: &FaceBox,
            target: &DynamicImage,
            _target_face: &FaceBox,
        ) -> EngineResult<DynamicImage> {
            self.swap_calls.fetch_add(1, Ordering::SeqCst);
            Ok(target.clone())
        }

        async fn enhance(&self, img: &DynamicImage) -> EngineResult<DynamicImage> {
            self.enhance_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_enhance {
                return Err(fswap_engine::EngineError::ServiceUnavailable(
                    "enhancer offline".to_string(),
                ));
            }
            Ok(img.clone())
        }
    }

    struct Inputs {
        _dir: TempDir,
        source: PathBuf,
        target: PathBuf,
    }

    fn write_inputs() -> Inputs {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.jpg");
        let target = dir.path().join("target.jpg");

        let source_img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            SOURCE_SIZE,
            SOURCE_SIZE,
            image::Rgb([200, 30, 30]),
        ));
        let target_img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            TARGET_SIZE,
            TARGET_SIZE,
            image::Rgb([30, 30, 200]),
        ));

        std::fs::write(&source, codec::encode_jpeg(&source_img).unwrap()).unwrap();
        std::fs::write(&target, codec::encode_jpeg(&target_img).unwrap()).unwrap();

        Inputs {
            _dir: dir,
            source,
            target,
        }
    }

    async fn run(engine: Arc<FakeEngine>, num_faces: u32) -> (Arc<JobSlot>, Inputs) {
        let inputs = write_inputs();
        let slot = Arc::new(JobSlot::new());
        let run_id = slot.begin_run().await.unwrap();
        run_swap_job(
            Arc::clone(&slot),
            engine,
            run_id,
            inputs.source.clone(),
            inputs.target.clone(),
            SwapOptions { num_faces },
        )
        .await;
        (slot, inputs)
    }

    #[tokio::test]
    async fn test_successful_run_reaches_100_and_cleans_up() {
        let engine = Arc::new(FakeEngine::new(1, 3));
        let (slot, inputs) = run(Arc::clone(&engine), 3).await;

        let snap = slot.snapshot().await;
        assert_eq!(snap.progress, 100);
        assert!(!snap.processing);
        assert!(snap.error.is_none());

        assert_eq!(engine.swap_calls.load(Ordering::SeqCst), 3);
        assert_eq!(engine.enhance_calls.load(Ordering::SeqCst), 1);

        let crate::slot::ResultView::Ready { jpeg, .. } = slot.result().await else {
            panic!("expected a ready result");
        };
        let out = codec::decode(&jpeg).unwrap();
        assert_eq!(out.width(), TARGET_SIZE);

        assert!(!inputs.source.exists());
        assert!(!inputs.target.exists());
    }

    #[tokio::test]
    async fn test_num_faces_clamps_to_detected_count() {
        let engine = Arc::new(FakeEngine::new(1, 2));
        let (slot, _inputs) = run(Arc::clone(&engine), 5).await;

        assert_eq!(engine.swap_calls.load(Ordering::SeqCst), 2);
        assert_eq!(slot.snapshot().await.progress, 100);
    }

    #[tokio::test]
    async fn test_zero_requested_faces_enhances_unmodified_target() {
        let engine = Arc::new(FakeEngine::new(1, 3));
        let (slot, _inputs) = run(Arc::clone(&engine), 0).await;

        assert_eq!(engine.swap_calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.enhance_calls.load(Ordering::SeqCst), 1);

        let crate::slot::ResultView::Ready { jpeg, .. } = slot.result().await else {
            panic!("expected a ready result");
        };
        let out = codec::decode(&jpeg).unwrap();
        assert_eq!((out.width(), out.height()), (TARGET_SIZE, TARGET_SIZE));
    }

    #[tokio::test]
    async fn test_zero_target_faces_still_succeeds() {
        let engine = Arc::new(FakeEngine::new(1, 0));
        let (slot, _inputs) = run(Arc::clone(&engine), 4).await;

        assert_eq!(engine.swap_calls.load(Ordering::SeqCst), 0);
        assert_eq!(slot.snapshot().await.progress, 100);
    }

    #[tokio::test]
    async fn test_no_source_face_fails_cleanly() {
        let engine = Arc::new(FakeEngine::new(0, 3));
        let (slot, inputs) = run(Arc::clone(&engine), 1).await;

        let snap = slot.snapshot().await;
        assert!(!snap.processing);
        assert_eq!(
            snap.error.as_deref(),
            Some("No face detected in source image")
        );
        assert_eq!(slot.result().await, crate::slot::ResultView::NotFound);

        // Cleanup runs on the failure path too.
        assert!(!inputs.source.exists());
        assert!(!inputs.target.exists());
    }

    #[tokio::test]
    async fn test_enhance_failure_leaves_swap_progress() {
        let mut engine = FakeEngine::new(1, 2);
        engine.fail_enhance = true;
        let (slot, _inputs) = run(Arc::new(engine), 2).await;

        let snap = slot.snapshot().await;
        assert!(!snap.processing);
        // Both swaps finished, so progress was left at the swap ceiling.
        assert_eq!(snap.progress, 90);
        assert!(snap.error.as_deref().unwrap().contains("enhancer offline"));
        assert_eq!(slot.result().await, crate::slot::ResultView::NotFound);
    }

    #[tokio::test]
    async fn test_unreadable_input_fails_cleanly() {
        let engine: Arc<FakeEngine> = Arc::new(FakeEngine::new(1, 1));
        let slot = Arc::new(JobSlot::new());
        let run_id = slot.begin_run().await.unwrap();

        run_swap_job(
            Arc::clone(&slot),
            engine,
            run_id,
            PathBuf::from("/nonexistent/source.jpg"),
            PathBuf::from("/nonexistent/target.jpg"),
            SwapOptions::default(),
        )
        .await;

        let snap = slot.snapshot().await;
        assert!(!snap.processing);
        assert!(snap.error.is_some());
    }
}
