use std::fmt;
use std::sync::Arc;

use crate::face::domain::emotion_recognizer::EmotionRecognizer;
use crate::face::domain::landmarks::LandmarkDetector;
use crate::face::domain::localizer::FaceLocalizer;
use crate::face::domain::template_encoder::FaceTemplateEncoder;
use crate::shared::biometric::BiometricModel;
use crate::shared::emotion::EmotionScores;
use crate::shared::error::{ResourceError, StageError};

/// Terminal outcome of a face enrollment session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceEnrollmentStatus {
    Success,
    NoFaceDetected,
    NotEnoughFacesDetected,
    MultipleFacesDetected,
    InternalError,
    CameraBusy,
    CameraFail,
}

impl FaceEnrollmentStatus {
    /// Whether a new session with better-framed input could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FaceEnrollmentStatus::NoFaceDetected
                | FaceEnrollmentStatus::NotEnoughFacesDetected
                | FaceEnrollmentStatus::MultipleFacesDetected
                | FaceEnrollmentStatus::CameraBusy
        )
    }

    pub fn is_resource_failure(&self) -> bool {
        matches!(
            self,
            FaceEnrollmentStatus::CameraBusy | FaceEnrollmentStatus::CameraFail
        )
    }

    /// Maps a stage failure to the status that ends the session.
    pub fn from_stage_error(err: &StageError) -> Self {
        match err {
            StageError::Resource(ResourceError::CameraBusy) => FaceEnrollmentStatus::CameraBusy,
            StageError::Resource(ResourceError::CameraFail) => FaceEnrollmentStatus::CameraFail,
            StageError::Input(_)
            | StageError::TimedOut
            | StageError::Upstream { .. }
            | StageError::Internal(_) => FaceEnrollmentStatus::InternalError,
        }
    }
}

impl fmt::Display for FaceEnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FaceEnrollmentStatus::Success => "success",
            FaceEnrollmentStatus::NoFaceDetected => "no face detected",
            FaceEnrollmentStatus::NotEnoughFacesDetected => "not enough faces detected",
            FaceEnrollmentStatus::MultipleFacesDetected => "multiple faces detected",
            FaceEnrollmentStatus::InternalError => "internal error",
            FaceEnrollmentStatus::CameraBusy => "camera busy",
            FaceEnrollmentStatus::CameraFail => "camera failure",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FaceEnrollmentOutput {
    pub model: BiometricModel,
    /// Mean emotion over the accepted frames.
    pub emotions: EmotionScores,
}

/// Stage providers a face enrollment session drives.
#[derive(Clone)]
pub struct FaceEnrollmentStages {
    pub localizer: Arc<dyn FaceLocalizer>,
    pub landmarks: Arc<dyn LandmarkDetector>,
    pub emotion: Arc<dyn EmotionRecognizer>,
    pub encoder: Arc<dyn FaceTemplateEncoder>,
}
