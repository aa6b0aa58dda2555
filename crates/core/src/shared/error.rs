use std::fmt;

use thiserror::Error;

use crate::shared::biometric::Modality;
use crate::shared::constants::{HAND_COUNT, MAX_LANDMARK_COUNT};

/// Names a node of the sensing dependency graph, for error attribution and timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Localization,
    Landmark,
    Headpose,
    Gesture,
    Emotion,
    Authentication,
    PitchDetection,
    ToneDetection,
    HandTracking,
    EyeTracking,
    Enrollment,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Localization => "localization",
            Stage::Landmark => "landmark",
            Stage::Headpose => "headpose",
            Stage::Gesture => "gesture",
            Stage::Emotion => "emotion",
            Stage::Authentication => "authentication",
            Stage::PitchDetection => "pitch",
            Stage::ToneDetection => "tone",
            Stage::HandTracking => "hand_tracking",
            Stage::EyeTracking => "eye_tracking",
            Stage::Enrollment => "enrollment",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synchronous rejection of a stage's input. Never degraded into an empty result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    #[error(
        "bounding box at ({x}, {y}) size {width}x{height} lies outside the {frame_width}x{frame_height} frame"
    )]
    BoxOutOfBounds {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        frame_width: u32,
        frame_height: u32,
    },
    #[error("insufficient landmarks: need {required}, got {actual}")]
    InsufficientLandmarks { required: usize, actual: usize },
    #[error("degenerate landmarks: {0}")]
    DegenerateLandmarks(&'static str),
    #[error("landmark count {0} exceeds capacity {MAX_LANDMARK_COUNT}")]
    LandmarkCapacity(usize),
    #[error("identity {0:?} appears more than once in the template set")]
    DuplicateIdentity(String),
    #[error("template {id:?} is a {actual} model, expected {expected}")]
    ModalityMismatch {
        id: String,
        expected: Modality,
        actual: Modality,
    },
    #[error("{0} hands supplied, only {HAND_COUNT} slots exist")]
    TooManyHands(usize),
    #[error("audio clip contains no samples")]
    EmptyAudio,
    #[error("malformed audio clip: {0}")]
    MalformedAudio(String),
}

/// Capture resource failures. Surfaced to the caller, never retried here.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceError {
    #[error("camera is busy")]
    CameraBusy,
    #[error("camera failed")]
    CameraFail,
}

/// Failure of one stage invocation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("stage invocation timed out")]
    TimedOut,
    #[error("skipped because the {stage} stage failed")]
    Upstream { stage: Stage },
    #[error("internal error: {0}")]
    Internal(String),
}

impl StageError {
    pub fn internal(message: impl Into<String>) -> Self {
        StageError::Internal(message.into())
    }
}

/// Result of one stage branch inside a composite output.
pub type StageResult<T> = Result<T, StageError>;

/// Failure of a whole pipeline call (as opposed to one branch of it).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensingError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: StageError,
    },
    #[error("internal pipeline error: {0}")]
    Internal(String),
}

impl SensingError {
    pub fn stage(stage: Stage, source: StageError) -> Self {
        SensingError::Stage { stage, source }
    }
}
