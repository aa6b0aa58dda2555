use serde::{Deserialize, Serialize};

use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::StageError;
use crate::shared::frame::Frame;

/// Selects one of the two interchangeable face detector variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalizationAlgorithm {
    Nv,
    Kl,
}

/// Domain interface for face localization.
///
/// Zero faces is a valid `Ok(vec![])`. Errors are reserved for input the
/// detector cannot read.
pub trait FaceLocalizer: Send + Sync {
    fn localize(
        &self,
        frame: &Frame,
        algorithm: LocalizationAlgorithm,
    ) -> Result<Vec<BoundingBox>, StageError>;
}

/// Detected faces in detector order. The count is always the box count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocalizationOutput {
    boxes: Vec<BoundingBox>,
}

impl LocalizationOutput {
    pub fn new(boxes: Vec<BoundingBox>) -> Self {
        Self { boxes }
    }

    pub fn detected_face_count(&self) -> usize {
        self.boxes.len()
    }

    pub fn face_locations(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}
