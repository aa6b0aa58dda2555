use std::collections::VecDeque;

use crate::eye::domain::eye_tracker::EyeTracker;
use crate::eye::domain::eye_tracking::EyeSample;
use crate::shared::error::StageError;

/// Eye tracker that plays back a recorded sequence of calibrations and ticks.
///
/// Calibrations beyond the script succeed. Ticks beyond the script fail,
/// so an exhausted recording reads as lost tracking.
pub struct ScriptedEyeTracker {
    calibrations: VecDeque<Result<(), StageError>>,
    ticks: VecDeque<Result<EyeSample, StageError>>,
}

impl ScriptedEyeTracker {
    pub fn new(ticks: Vec<Result<EyeSample, StageError>>) -> Self {
        Self {
            calibrations: VecDeque::new(),
            ticks: ticks.into(),
        }
    }

    pub fn with_calibrations(mut self, calibrations: Vec<Result<(), StageError>>) -> Self {
        self.calibrations = calibrations.into();
        self
    }

    pub fn remaining_ticks(&self) -> usize {
        self.ticks.len()
    }
}

impl EyeTracker for ScriptedEyeTracker {
    fn calibrate(&mut self) -> Result<(), StageError> {
        self.calibrations.pop_front().unwrap_or(Ok(()))
    }

    fn tick(&mut self) -> Result<EyeSample, StageError> {
        self.ticks
            .pop_front()
            .unwrap_or_else(|| Err(StageError::internal("eye-tracking recording exhausted")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::ResourceError;

    #[test]
    fn test_plays_script_then_fails() {
        let mut tracker = ScriptedEyeTracker::new(vec![Ok(EyeSample::default())]);
        assert!(tracker.calibrate().is_ok());
        assert!(tracker.tick().is_ok());
        assert_eq!(tracker.remaining_ticks(), 0);
        assert!(matches!(tracker.tick(), Err(StageError::Internal(_))));
    }

    #[test]
    fn test_scripted_calibration_failure() {
        let mut tracker = ScriptedEyeTracker::new(Vec::new())
            .with_calibrations(vec![Err(ResourceError::CameraBusy.into())]);
        assert!(tracker.calibrate().is_err());
        assert!(tracker.calibrate().is_ok());
    }
}
