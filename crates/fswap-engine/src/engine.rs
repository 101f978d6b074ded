//! The [`FaceEngine`] collaborator trait.

use async_trait::async_trait;
use image::DynamicImage;

use fswap_models::FaceBox;

use crate::error::EngineResult;

/// Face detection, swap, and enhancement capability.
///
/// The job runner is written against this trait so it can be exercised
/// with fake engines in tests; the production implementation is
/// [`crate::HttpEngine`].
#[async_trait]
pub trait FaceEngine: Send + Sync {
    /// Detect faces in an image, in the detector's natural output order.
    /// An empty vector is a valid response, not an error.
    async fn detect_faces(&self, img: &DynamicImage) -> EngineResult<Vec<FaceBox>>;

    /// Swap `source_face` (cropped from `source`) onto `target_face`
    /// within `target`, returning the composited image.
    async fn swap_face(
        &self,
        source: &DynamicImage,
        source_face: &FaceBox,
        target: &DynamicImage,
        target_face: &FaceBox,
    ) -> EngineResult<DynamicImage>;

    /// Run a single enhancement pass over the whole image.
    async fn enhance(&self, img: &DynamicImage) -> EngineResult<DynamicImage>;
}
