use serde::{Deserialize, Serialize};

use crate::face::domain::landmarks::LandmarkSet;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::StageError;
use crate::shared::frame::Frame;

/// Which input the orchestrator builds for the headpose stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadposeMode {
    FromLandmarks,
    FromLocalization,
}

/// Headpose input carrying exactly the data its mode reads.
#[derive(Clone, Copy, Debug)]
pub enum HeadposeInput<'a> {
    FromLandmarks(&'a LandmarkSet),
    FromLocalization(&'a BoundingBox),
}

impl HeadposeInput<'_> {
    pub fn mode(&self) -> HeadposeMode {
        match self {
            HeadposeInput::FromLandmarks(_) => HeadposeMode::FromLandmarks,
            HeadposeInput::FromLocalization(_) => HeadposeMode::FromLocalization,
        }
    }
}

/// Head orientation in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Headpose {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

pub trait HeadposeEstimator: Send + Sync {
    fn estimate(&self, frame: &Frame, input: HeadposeInput<'_>) -> Result<Headpose, StageError>;
}
