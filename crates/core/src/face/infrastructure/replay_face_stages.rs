use std::collections::HashMap;
use std::sync::Arc;

use crate::face::domain::emotion_recognizer::EmotionRecognizer;
use crate::face::domain::landmarks::{LandmarkDetector, LandmarkSet};
use crate::face::domain::localizer::{FaceLocalizer, LocalizationAlgorithm};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::emotion::EmotionScores;
use crate::shared::error::StageError;
use crate::shared::frame::Frame;

/// Minimum IoU for a queried box to pick up a recorded face's results.
const REPLAY_MATCH_IOU: f32 = 0.5;

/// One face as an inference provider reported it during a recorded session.
#[derive(Clone, Debug)]
pub struct RecordedFace {
    pub bbox: BoundingBox,
    pub landmarks: LandmarkSet,
    pub emotion: Option<EmotionScores>,
}

/// What localization produced for a frame: faces, or a failure to replay.
#[derive(Clone, Debug)]
pub enum RecordedFrame {
    Faces(Vec<RecordedFace>),
    Failure(StageError),
}

/// Replays recorded localization, landmark and emotion results by frame index.
///
/// Lets the pipelines and enrollment sessions run against captured provider
/// output, reproducing the exact boxes and failures a session saw. Frames
/// with no recording localize to zero faces.
pub struct ReplayFaceStages {
    frames: Arc<HashMap<usize, RecordedFrame>>,
}

impl ReplayFaceStages {
    pub fn new(frames: Arc<HashMap<usize, RecordedFrame>>) -> Self {
        Self { frames }
    }

    fn faces(&self, frame: &Frame) -> &[RecordedFace] {
        match self.frames.get(&frame.index()) {
            Some(RecordedFrame::Faces(faces)) => faces,
            _ => &[],
        }
    }

    fn matching_face(&self, frame: &Frame, bbox: &BoundingBox) -> Option<&RecordedFace> {
        self.faces(frame)
            .iter()
            .map(|f| (f.bbox.iou(bbox), f))
            .filter(|(iou, _)| *iou >= REPLAY_MATCH_IOU)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, f)| f)
    }
}

impl FaceLocalizer for ReplayFaceStages {
    fn localize(
        &self,
        frame: &Frame,
        _algorithm: LocalizationAlgorithm,
    ) -> Result<Vec<BoundingBox>, StageError> {
        match self.frames.get(&frame.index()) {
            Some(RecordedFrame::Failure(err)) => Err(err.clone()),
            Some(RecordedFrame::Faces(faces)) => Ok(faces.iter().map(|f| f.bbox).collect()),
            None => Ok(Vec::new()),
        }
    }
}

impl LandmarkDetector for ReplayFaceStages {
    fn detect(&self, frame: &Frame, bbox: &BoundingBox) -> Result<LandmarkSet, StageError> {
        bbox.ensure_within(frame.width(), frame.height())?;
        Ok(self
            .matching_face(frame, bbox)
            .map(|f| f.landmarks.clone())
            .unwrap_or_default())
    }
}

impl EmotionRecognizer for ReplayFaceStages {
    fn recognize(
        &self,
        frame: &Frame,
        _landmarks: &LandmarkSet,
        bbox: &BoundingBox,
    ) -> Result<EmotionScores, StageError> {
        self.matching_face(frame, bbox)
            .and_then(|f| f.emotion)
            .ok_or_else(|| {
                StageError::internal(format!(
                    "no recorded emotion for frame {} at ({}, {})",
                    frame.index(),
                    bbox.x,
                    bbox.y
                ))
            })
    }
}
