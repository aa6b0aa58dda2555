use crate::face::domain::landmarks::LandmarkSet;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::emotion::EmotionScores;
use crate::shared::error::StageError;
use crate::shared::frame::Frame;

pub trait EmotionRecognizer: Send + Sync {
    fn recognize(
        &self,
        frame: &Frame,
        landmarks: &LandmarkSet,
        bbox: &BoundingBox,
    ) -> Result<EmotionScores, StageError>;
}
