use std::sync::Arc;
use std::time::Instant;

use crate::hand::domain::hand::HandGestureOutput;
use crate::hand::domain::hand_tracker::HandTracker;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::error::{SensingError, Stage, StageError};
use crate::shared::frame::Frame;

pub struct HandGestureUseCase {
    tracker: Arc<dyn HandTracker>,
    logger: Box<dyn PipelineLogger>,
}

impl HandGestureUseCase {
    pub fn new(tracker: Arc<dyn HandTracker>) -> Self {
        Self {
            tracker,
            logger: Box::new(NullPipelineLogger),
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn execute(&mut self, frame: &Frame) -> Result<HandGestureOutput, SensingError> {
        frame.validate()?;
        let start = Instant::now();
        let out = self
            .tracker
            .track(frame)
            .map_err(|e| SensingError::stage(Stage::HandTracking, e))?;
        self.logger
            .timing(Stage::HandTracking, start.elapsed().as_secs_f64() * 1000.0);

        if out.uses_reserved_status() {
            return Err(SensingError::stage(
                Stage::HandTracking,
                StageError::internal("tracker reported the reserved extrapolated status"),
            ));
        }

        let active = out.active_hands().count();
        self.logger.metric("active_hands", active as f64);
        log::debug!("Frame {}: {active} active hands", frame.index());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::hand::domain::hand::{FingerTrackingStatus, Hand, HandSide, HandTrackingStatus};
    use crate::hand::infrastructure::replay_hand_tracker::{RecordedHands, ReplayHandTracker};
    use crate::shared::constants::{FINGER_COUNT, HAND_COUNT};
    use crate::shared::error::ResourceError;
    use crate::shared::frame::ImageFormat;

    fn frame(index: usize) -> Frame {
        Frame::filled(0, 8, 8, ImageFormat::Ir, index)
    }

    fn use_case(frames: Vec<(usize, RecordedHands)>) -> HandGestureUseCase {
        let tracker = ReplayHandTracker::new(Arc::new(frames.into_iter().collect::<HashMap<_, _>>()));
        HandGestureUseCase::new(Arc::new(tracker))
    }

    #[test]
    fn test_output_always_has_fixed_slots() {
        let hand = Hand {
            tracking_status: HandTrackingStatus::Tracked,
            side: HandSide::Right,
            gesture: "thumbs_up".into(),
            ..Default::default()
        };
        let mut uc = use_case(vec![(0, RecordedHands::Hands(vec![hand]))]);

        for index in [0, 1] {
            let out = uc.execute(&frame(index)).unwrap();
            assert_eq!(out.hands.len(), HAND_COUNT);
            assert!(out.hands.iter().all(|h| h.fingers.len() == FINGER_COUNT));
        }
        assert_eq!(uc.execute(&frame(1)).unwrap().active_hands().count(), 0);
    }

    #[test]
    fn test_tracker_failure_fails_the_call() {
        let mut uc = use_case(vec![(0, RecordedHands::Failure(ResourceError::CameraFail.into()))]);
        assert_eq!(
            uc.execute(&frame(0)).unwrap_err(),
            SensingError::stage(
                Stage::HandTracking,
                StageError::Resource(ResourceError::CameraFail)
            )
        );
    }

    #[test]
    fn test_reserved_status_is_rejected() {
        let mut hand = Hand {
            tracking_status: HandTrackingStatus::Tracked,
            ..Default::default()
        };
        hand.fingers[0].tracking_status = FingerTrackingStatus::Extrapolated;
        let mut uc = use_case(vec![(0, RecordedHands::Hands(vec![hand]))]);
        assert!(matches!(
            uc.execute(&frame(0)),
            Err(SensingError::Stage {
                stage: Stage::HandTracking,
                ..
            })
        ));
    }
}
