//! Detected face geometry.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box of one detected face, in pixels.
///
/// Ordering within a detection response is the detector's natural output
/// order; callers must not assume position sorting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Detector confidence in [0,1]
    pub score: f32,
}

impl FaceBox {
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}
