use std::collections::HashMap;
use std::sync::Arc;

use crate::hand::domain::hand::{Hand, HandGestureOutput};
use crate::hand::domain::hand_tracker::HandTracker;
use crate::shared::error::StageError;
use crate::shared::frame::Frame;

#[derive(Clone, Debug)]
pub enum RecordedHands {
    Hands(Vec<Hand>),
    Failure(StageError),
}

/// Hand tracker that replays recorded results keyed by frame index.
///
/// Frames without a recording have no hands in view.
pub struct ReplayHandTracker {
    frames: Arc<HashMap<usize, RecordedHands>>,
}

impl ReplayHandTracker {
    pub fn new(frames: Arc<HashMap<usize, RecordedHands>>) -> Self {
        Self { frames }
    }
}

impl HandTracker for ReplayHandTracker {
    fn track(&self, frame: &Frame) -> Result<HandGestureOutput, StageError> {
        match self.frames.get(&frame.index()) {
            None => Ok(HandGestureOutput::default()),
            Some(RecordedHands::Hands(hands)) => Ok(HandGestureOutput::from_hands(hands.clone())?),
            Some(RecordedHands::Failure(err)) => Err(err.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::domain::hand::{HandSide, HandTrackingStatus};
    use crate::shared::error::{InputError, ResourceError};
    use crate::shared::frame::ImageFormat;

    fn frame(index: usize) -> Frame {
        Frame::filled(0, 4, 4, ImageFormat::Rgb, index)
    }

    fn tracker() -> ReplayHandTracker {
        let hand = Hand {
            tracking_status: HandTrackingStatus::Detected,
            side: HandSide::Left,
            ..Default::default()
        };
        let mut frames = HashMap::new();
        frames.insert(0, RecordedHands::Hands(vec![hand]));
        frames.insert(1, RecordedHands::Failure(ResourceError::CameraFail.into()));
        frames.insert(2, RecordedHands::Hands(vec![Hand::default(); 3]));
        ReplayHandTracker::new(Arc::new(frames))
    }

    #[test]
    fn test_recorded_hand_is_replayed() {
        let out = tracker().track(&frame(0)).unwrap();
        assert_eq!(out.hands[0].side, HandSide::Left);
        assert!(!out.hands[1].is_active());
    }

    #[test]
    fn test_unknown_frame_has_no_hands() {
        assert_eq!(tracker().track(&frame(7)).unwrap(), HandGestureOutput::default());
    }

    #[test]
    fn test_recorded_failure_is_replayed() {
        assert_eq!(
            tracker().track(&frame(1)).unwrap_err(),
            StageError::Resource(ResourceError::CameraFail)
        );
    }

    #[test]
    fn test_too_many_recorded_hands_is_input_error() {
        assert_eq!(
            tracker().track(&frame(2)).unwrap_err(),
            StageError::Input(InputError::TooManyHands(3))
        );
    }
}
