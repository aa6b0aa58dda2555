use std::sync::Arc;

use crate::face::domain::authenticator::FaceAuthenticator;
use crate::face::domain::emotion_recognizer::EmotionRecognizer;
use crate::face::domain::gesture::{FacialGesture, GestureClassifier};
use crate::face::domain::headpose::{Headpose, HeadposeEstimator};
use crate::face::domain::landmarks::{LandmarkDetector, LandmarkSet};
use crate::face::domain::localizer::{FaceLocalizer, LocalizationOutput};
use crate::shared::biometric::AuthenticationOutput;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::emotion::EmotionScores;
use crate::shared::error::{Stage, StageError, StageResult};

/// The six face stage providers, shared read-only across worker threads.
#[derive(Clone)]
pub struct FaceStages {
    pub localizer: Arc<dyn FaceLocalizer>,
    pub landmarks: Arc<dyn LandmarkDetector>,
    pub headpose: Arc<dyn HeadposeEstimator>,
    pub gesture: Arc<dyn GestureClassifier>,
    pub emotion: Arc<dyn EmotionRecognizer>,
    pub authenticator: Arc<dyn FaceAuthenticator>,
}

/// Every branch result for a single face, plus how long each stage took.
#[derive(Clone, Debug)]
pub struct FaceReport {
    pub landmarks: StageResult<LandmarkSet>,
    pub headpose: StageResult<Headpose>,
    pub gesture: StageResult<FacialGesture>,
    pub emotion: StageResult<EmotionScores>,
    pub authentication: StageResult<AuthenticationOutput>,
    pub timings: Vec<(Stage, f64)>,
}

impl FaceReport {
    /// A report where every branch carries the same failure.
    pub fn failed(err: StageError) -> Self {
        Self {
            landmarks: Err(err.clone()),
            headpose: Err(err.clone()),
            gesture: Err(err.clone()),
            emotion: Err(err.clone()),
            authentication: Err(err),
            timings: Vec::new(),
        }
    }
}

/// Composite result of one face-analysis call.
///
/// Every per-face vector has `faces.detected_face_count()` entries and
/// entry `i` of each describes `faces.face_locations()[i]`. A branch that
/// failed keeps its slot as an `Err`.
#[derive(Clone, Debug)]
pub struct FaceAnalysisOutput {
    pub faces: LocalizationOutput,
    pub landmarks: Vec<StageResult<LandmarkSet>>,
    pub headpose: Vec<StageResult<Headpose>>,
    pub gestures: Vec<StageResult<FacialGesture>>,
    pub emotions: Vec<StageResult<EmotionScores>>,
    pub authentication: Vec<StageResult<AuthenticationOutput>>,
}

impl FaceAnalysisOutput {
    /// Assembles index-aligned vectors from per-face reports.
    pub fn from_reports(
        faces: LocalizationOutput,
        reports: Vec<FaceReport>,
    ) -> Result<Self, StageError> {
        if reports.len() != faces.detected_face_count() {
            return Err(StageError::internal(format!(
                "{} face reports for {} detected faces",
                reports.len(),
                faces.detected_face_count()
            )));
        }

        let n = reports.len();
        let mut out = Self {
            faces,
            landmarks: Vec::with_capacity(n),
            headpose: Vec::with_capacity(n),
            gestures: Vec::with_capacity(n),
            emotions: Vec::with_capacity(n),
            authentication: Vec::with_capacity(n),
        };
        for r in reports {
            out.landmarks.push(r.landmarks);
            out.headpose.push(r.headpose);
            out.gestures.push(r.gesture);
            out.emotions.push(r.emotion);
            out.authentication.push(r.authentication);
        }
        Ok(out)
    }

    pub fn detected_face_count(&self) -> usize {
        self.faces.detected_face_count()
    }

    pub fn faces(&self) -> impl Iterator<Item = FaceResult<'_>> + '_ {
        self.faces
            .face_locations()
            .iter()
            .enumerate()
            .map(move |(i, bbox)| FaceResult {
                index: i,
                bbox,
                landmarks: &self.landmarks[i],
                headpose: &self.headpose[i],
                gesture: &self.gestures[i],
                emotion: &self.emotions[i],
                authentication: &self.authentication[i],
            })
    }
}

/// Borrowed view of everything known about face `index`.
#[derive(Clone, Copy, Debug)]
pub struct FaceResult<'a> {
    pub index: usize,
    pub bbox: &'a BoundingBox,
    pub landmarks: &'a StageResult<LandmarkSet>,
    pub headpose: &'a StageResult<Headpose>,
    pub gesture: &'a StageResult<FacialGesture>,
    pub emotion: &'a StageResult<EmotionScores>,
    pub authentication: &'a StageResult<AuthenticationOutput>,
}

impl FaceResult<'_> {
    pub fn is_complete(&self) -> bool {
        self.landmarks.is_ok()
            && self.headpose.is_ok()
            && self.gesture.is_ok()
            && self.emotion.is_ok()
            && self.authentication.is_ok()
    }
}
