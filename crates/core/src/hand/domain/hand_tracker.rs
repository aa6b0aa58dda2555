use crate::hand::domain::hand::HandGestureOutput;
use crate::shared::error::StageError;
use crate::shared::frame::Frame;

/// Per-frame hand and finger classification.
pub trait HandTracker: Send + Sync {
    fn track(&self, frame: &Frame) -> Result<HandGestureOutput, StageError>;
}
