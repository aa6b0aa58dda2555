//! Headpose from the iBUG 68-point layout.
//!
//! Angles are measured in a frame aligned with the eye line, so roll does
//! not leak into yaw or pitch:
//! - roll: angle of the outer-eye-corner line against the image x axis
//! - yaw: nose offset along the eye line relative to the eye span,
//!   0 = frontal, ±90 = full profile
//! - pitch: nose height between eye line and mouth, relative to a neutral ratio

use std::sync::Arc;

use crate::face::domain::headpose::{Headpose, HeadposeEstimator, HeadposeInput};
use crate::face::domain::landmarks::{LandmarkDetector, LandmarkSet};
use crate::shared::constants::IBUG_LANDMARK_COUNT;
use crate::shared::error::{InputError, StageError};
use crate::shared::frame::Frame;

const OUTER_EYE_LEFT: usize = 36;
const OUTER_EYE_RIGHT: usize = 45;
const NOSE_TIP: usize = 30;
const MOUTH_LEFT: usize = 48;
const MOUTH_RIGHT: usize = 54;

/// Nose tip height, as a fraction of eye-line-to-mouth distance, for a level head.
pub const DEFAULT_NEUTRAL_NOSE_RATIO: f32 = 0.45;

pub struct GeometricHeadposeEstimator {
    landmarks: Arc<dyn LandmarkDetector>,
    neutral_nose_ratio: f32,
}

impl GeometricHeadposeEstimator {
    /// `landmarks` serves the `FromLocalization` mode, which must find its own points.
    pub fn new(landmarks: Arc<dyn LandmarkDetector>) -> Self {
        Self {
            landmarks,
            neutral_nose_ratio: DEFAULT_NEUTRAL_NOSE_RATIO,
        }
    }

    pub fn with_neutral_nose_ratio(mut self, ratio: f32) -> Self {
        self.neutral_nose_ratio = ratio;
        self
    }

    fn from_landmarks(&self, landmarks: &LandmarkSet) -> Result<Headpose, StageError> {
        landmarks.require(IBUG_LANDMARK_COUNT)?;
        let pts = landmarks.points();

        let left = pts[OUTER_EYE_LEFT];
        let right = pts[OUTER_EYE_RIGHT];
        let span = left.planar_distance(&right);
        if span <= f32::EPSILON {
            return Err(InputError::DegenerateLandmarks("eye corners coincide").into());
        }

        let ex = (right.x - left.x) / span;
        let ey = (right.y - left.y) / span;
        let (nx, ny) = (-ey, ex);
        let eye_mid = left.midpoint(&right);

        let nose = pts[NOSE_TIP];
        let (rx, ry) = (nose.x - eye_mid.x, nose.y - eye_mid.y);
        let along = rx * ex + ry * ey;
        let across = rx * nx + ry * ny;

        let mouth_mid = pts[MOUTH_LEFT].midpoint(&pts[MOUTH_RIGHT]);
        let mouth_depth = (mouth_mid.x - eye_mid.x) * nx + (mouth_mid.y - eye_mid.y) * ny;
        if mouth_depth <= f32::EPSILON {
            return Err(InputError::DegenerateLandmarks("mouth is not below the eye line").into());
        }

        let roll = ey.atan2(ex).to_degrees();
        let yaw = (along / span).clamp(-1.0, 1.0) * 90.0;
        let nose_ratio = across / mouth_depth;
        let pitch = ((self.neutral_nose_ratio - nose_ratio) / self.neutral_nose_ratio)
            .clamp(-1.0, 1.0)
            * 90.0;

        Ok(Headpose { yaw, pitch, roll })
    }
}

impl HeadposeEstimator for GeometricHeadposeEstimator {
    fn estimate(&self, frame: &Frame, input: HeadposeInput<'_>) -> Result<Headpose, StageError> {
        match input {
            HeadposeInput::FromLandmarks(landmarks) => self.from_landmarks(landmarks),
            HeadposeInput::FromLocalization(bbox) => {
                bbox.ensure_within(frame.width(), frame.height())?;
                let landmarks = self.landmarks.detect(frame, bbox)?;
                self.from_landmarks(&landmarks)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::infrastructure::test_faces::{ibug_face, ibug_points, rotated, FaceShape};
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::frame::ImageFormat;
    use approx::assert_relative_eq;

    struct FixedLandmarks(LandmarkSet);

    impl LandmarkDetector for FixedLandmarks {
        fn detect(&self, _: &Frame, _: &BoundingBox) -> Result<LandmarkSet, StageError> {
            Ok(self.0.clone())
        }
    }

    fn estimator(set: LandmarkSet) -> GeometricHeadposeEstimator {
        GeometricHeadposeEstimator::new(Arc::new(FixedLandmarks(set)))
    }

    fn frame() -> Frame {
        Frame::filled(0, 200, 200, ImageFormat::Rgb, 0)
    }

    #[test]
    fn test_frontal_face_is_level() {
        let face = ibug_face(&FaceShape::default());
        let pose = estimator(LandmarkSet::empty())
            .estimate(&frame(), HeadposeInput::FromLandmarks(&face))
            .unwrap();
        assert_relative_eq!(pose.yaw, 0.0, epsilon = 1e-3);
        assert_relative_eq!(pose.pitch, 0.0, epsilon = 1e-3);
        assert_relative_eq!(pose.roll, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_nose_offset_turns_yaw() {
        // offset 15 over a 60px eye span = 0.25 of full profile
        let face = ibug_face(&FaceShape {
            nose_dx: 15.0,
            ..Default::default()
        });
        let pose = estimator(LandmarkSet::empty())
            .estimate(&frame(), HeadposeInput::FromLandmarks(&face))
            .unwrap();
        assert_relative_eq!(pose.yaw, 22.5, epsilon = 1e-3);
    }

    #[test]
    fn test_raised_nose_pitches_up() {
        let face = ibug_face(&FaceShape {
            nose_ratio: 0.3,
            ..Default::default()
        });
        let pose = estimator(LandmarkSet::empty())
            .estimate(&frame(), HeadposeInput::FromLandmarks(&face))
            .unwrap();
        // (0.45 - 0.3) / 0.45 * 90
        assert_relative_eq!(pose.pitch, 30.0, epsilon = 1e-2);
    }

    #[test]
    fn test_tilted_head_reports_roll_only() {
        let face = rotated(&ibug_points(&FaceShape::default()), 20.0);
        let pose = estimator(LandmarkSet::empty())
            .estimate(&frame(), HeadposeInput::FromLandmarks(&face))
            .unwrap();
        assert_relative_eq!(pose.roll, 20.0, epsilon = 1e-2);
        assert_relative_eq!(pose.yaw, 0.0, epsilon = 1e-2);
        assert_relative_eq!(pose.pitch, 0.0, epsilon = 1e-2);
    }

    #[test]
    fn test_from_localization_detects_its_own_landmarks() {
        let face = ibug_face(&FaceShape {
            nose_dx: -15.0,
            ..Default::default()
        });
        let bbox = BoundingBox::new(50.0, 50.0, 100.0, 100.0);
        let pose = estimator(face)
            .estimate(&frame(), HeadposeInput::FromLocalization(&bbox))
            .unwrap();
        assert_relative_eq!(pose.yaw, -22.5, epsilon = 1e-3);
    }

    #[test]
    fn test_from_localization_rejects_out_of_bounds_box() {
        let bbox = BoundingBox::new(150.0, 150.0, 100.0, 100.0);
        let err = estimator(ibug_face(&FaceShape::default()))
            .estimate(&frame(), HeadposeInput::FromLocalization(&bbox))
            .unwrap_err();
        assert!(matches!(err, StageError::Input(InputError::BoxOutOfBounds { .. })));
    }

    #[test]
    fn test_empty_landmarks_is_input_error() {
        let err = estimator(LandmarkSet::empty())
            .estimate(&frame(), HeadposeInput::FromLandmarks(&LandmarkSet::empty()))
            .unwrap_err();
        assert!(matches!(
            err,
            StageError::Input(InputError::InsufficientLandmarks { .. })
        ));
    }
}
