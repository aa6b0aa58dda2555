use crate::shared::biometric::BiometricModel;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::StageError;
use crate::shared::frame::Frame;

/// Produces a fixed-length feature vector for one face crop.
pub trait FaceEmbeddingExtractor: Send + Sync {
    fn extract(&self, frame: &Frame, bbox: &BoundingBox) -> Result<Vec<f32>, StageError>;
}

/// Turns per-frame enrollment evidence into a durable face template.
///
/// `sample` runs while the caller's frame is still borrowed; `build` only
/// sees the extracted samples, so a session never holds on to frames.
pub trait FaceTemplateEncoder: Send + Sync {
    fn sample(&self, frame: &Frame, bbox: &BoundingBox) -> Result<Vec<f32>, StageError>;

    fn build(&self, identity: &str, samples: &[Vec<f32>]) -> Result<BiometricModel, StageError>;
}
