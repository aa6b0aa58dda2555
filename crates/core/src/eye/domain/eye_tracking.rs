use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::point::Point3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    Normal,
    /// Transient loss; the output repeats the last good sample.
    Recovery,
    /// Terminal until recalibrated.
    Stopped,
    Calibrating,
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrackingState::Normal => "normal",
            TrackingState::Recovery => "recovery",
            TrackingState::Stopped => "stopped",
            TrackingState::Calibrating => "calibrating",
        };
        f.write_str(s)
    }
}

/// Where the tracker sits relative to the viewer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerPosition {
    #[default]
    Unknown,
    Center,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EyePosition {
    pub absolute: Point3,
    /// Each axis in [0, 1] over the tracking volume.
    pub normalized: Point3,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EyePositionOutput {
    pub left: EyePosition,
    pub right: EyePosition,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GazeOutput {
    pub timestamp_ms: f32,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FixationOutput {
    pub description: String,
    pub timestamp_ms: f32,
    pub x: f32,
    pub y: f32,
}

/// One successful tracker reading.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeSample {
    pub position: EyePositionOutput,
    pub gaze: GazeOutput,
    pub fixation: FixationOutput,
    pub tracker: TrackerPosition,
}

/// One tick of the eye-tracking stream.
///
/// `sample` is the latest good reading since the last calibration: fresh in
/// `Normal`, repeated in `Recovery` and `Stopped`, and `None` from
/// `Calibrating` until the first good tick after it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EyeTrackingOutput {
    pub tick: u64,
    pub state: TrackingState,
    pub sample: Option<EyeSample>,
}
