//! Eye and mouth state from aspect ratios over the iBUG 68-point layout.

use crate::face::domain::gesture::{EyeState, FacialGesture, GestureClassifier, MouthState};
use crate::face::domain::landmarks::LandmarkSet;
use crate::shared::constants::IBUG_LANDMARK_COUNT;
use crate::shared::error::StageError;
use crate::shared::point::Point3;

/// Mean eye aspect ratio below which eyes count as closed.
pub const DEFAULT_EYE_CLOSED_RATIO: f32 = 0.2;

/// Inner-lip aspect ratio above which the mouth counts as open.
pub const DEFAULT_MOUTH_OPEN_RATIO: f32 = 0.3;

/// Six-point eye contours: [outer, upper, upper, inner, lower, lower].
const RIGHT_EYE: [usize; 6] = [36, 37, 38, 39, 40, 41];
const LEFT_EYE: [usize; 6] = [42, 43, 44, 45, 46, 47];

/// Inner lip: corners 60/64, vertical pairs (61,67), (62,66), (63,65).
const INNER_LIP_CORNERS: (usize, usize) = (60, 64);
const INNER_LIP_PAIRS: [(usize, usize); 3] = [(61, 67), (62, 66), (63, 65)];

pub struct GeometricGestureClassifier {
    eye_closed_ratio: f32,
    mouth_open_ratio: f32,
}

impl GeometricGestureClassifier {
    pub fn new(eye_closed_ratio: f32, mouth_open_ratio: f32) -> Self {
        Self {
            eye_closed_ratio,
            mouth_open_ratio,
        }
    }
}

impl Default for GeometricGestureClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_EYE_CLOSED_RATIO, DEFAULT_MOUTH_OPEN_RATIO)
    }
}

impl GestureClassifier for GeometricGestureClassifier {
    fn classify(&self, landmarks: &LandmarkSet) -> Result<FacialGesture, StageError> {
        landmarks.require(IBUG_LANDMARK_COUNT)?;
        let pts = landmarks.points();

        let ear = (eye_aspect_ratio(pts, &RIGHT_EYE) + eye_aspect_ratio(pts, &LEFT_EYE)) / 2.0;
        let mar = mouth_aspect_ratio(pts);

        let eyes = if ear < self.eye_closed_ratio {
            EyeState::Closed
        } else {
            EyeState::Open
        };
        let mouth = if mar > self.mouth_open_ratio {
            MouthState::Open
        } else {
            MouthState::Closed
        };
        log::trace!("gesture: ear={ear:.3} mar={mar:.3}");
        Ok(FacialGesture { eyes, mouth })
    }
}

fn eye_aspect_ratio(pts: &[Point3], eye: &[usize; 6]) -> f32 {
    let width = pts[eye[0]].planar_distance(&pts[eye[3]]);
    if width <= f32::EPSILON {
        return 0.0;
    }
    let v1 = pts[eye[1]].planar_distance(&pts[eye[5]]);
    let v2 = pts[eye[2]].planar_distance(&pts[eye[4]]);
    (v1 + v2) / (2.0 * width)
}

fn mouth_aspect_ratio(pts: &[Point3]) -> f32 {
    let width = pts[INNER_LIP_CORNERS.0].planar_distance(&pts[INNER_LIP_CORNERS.1]);
    if width <= f32::EPSILON {
        return 0.0;
    }
    let vertical: f32 = INNER_LIP_PAIRS
        .iter()
        .map(|&(a, b)| pts[a].planar_distance(&pts[b]))
        .sum();
    vertical / (INNER_LIP_PAIRS.len() as f32 * width)
}
