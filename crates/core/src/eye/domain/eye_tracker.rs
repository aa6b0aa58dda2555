use crate::eye::domain::eye_tracking::EyeSample;
use crate::shared::error::StageError;

/// A stateful eye-tracking device. Owned by a single producer thread.
pub trait EyeTracker: Send {
    fn calibrate(&mut self) -> Result<(), StageError>;

    /// Reads the next sample. An error means tracking was lost for this tick.
    fn tick(&mut self) -> Result<EyeSample, StageError>;
}
