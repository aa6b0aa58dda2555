//! Fixed-capacity facial landmark sets.
//!
//! Point order is provider-defined and meaningful: index `i` is the same
//! anatomical feature in every set a provider returns, so nothing here
//! ever sorts, dedups or compacts points.

use std::fmt;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::MAX_LANDMARK_COUNT;
use crate::shared::error::{InputError, StageError};
use crate::shared::frame::Frame;
use crate::shared::point::Point3;

/// Domain interface for landmark detection inside one face box.
pub trait LandmarkDetector: Send + Sync {
    fn detect(&self, frame: &Frame, bbox: &BoundingBox) -> Result<LandmarkSet, StageError>;
}

#[derive(Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Point3; MAX_LANDMARK_COUNT],
    count: usize,
}

impl LandmarkSet {
    /// Fails when more than [`MAX_LANDMARK_COUNT`] points are supplied.
    pub fn new(points: &[Point3]) -> Result<Self, InputError> {
        if points.len() > MAX_LANDMARK_COUNT {
            return Err(InputError::LandmarkCapacity(points.len()));
        }
        let mut set = Self::empty();
        set.points[..points.len()].copy_from_slice(points);
        set.count = points.len();
        Ok(set)
    }

    /// The valid degenerate result: a face with no usable landmarks.
    pub fn empty() -> Self {
        Self {
            points: [Point3::ORIGIN; MAX_LANDMARK_COUNT],
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        MAX_LANDMARK_COUNT
    }

    pub fn points(&self) -> &[Point3] {
        &self.points[..self.count]
    }

    pub fn get(&self, index: usize) -> Option<&Point3> {
        self.points().get(index)
    }

    /// Input error unless at least `required` points are present.
    pub fn require(&self, required: usize) -> Result<(), InputError> {
        if self.count < required {
            return Err(InputError::InsufficientLandmarks {
                required,
                actual: self.count,
            });
        }
        Ok(())
    }

    pub fn centroid(&self) -> Option<Point3> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f32;
        let sum = self.points().iter().fold(Point3::ORIGIN, |acc, p| {
            Point3::new(acc.x + p.x, acc.y + p.y, acc.z + p.z)
        });
        Some(Point3::new(sum.x / n, sum.y / n, sum.z / n))
    }
}

impl Default for LandmarkSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for LandmarkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LandmarkSet")
            .field("count", &self.count)
            .field("points", &self.points())
            .finish()
    }
}
