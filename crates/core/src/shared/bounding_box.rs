use serde::{Deserialize, Serialize};

use crate::shared::error::InputError;

/// Axis-aligned face box in image coordinates (top-left origin, pixels).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = (self.x + self.width).min(other.x + other.width);
        let iy2 = (self.y + self.height).min(other.y + other.height);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }

        inter / (self.area() + other.area() - inter)
    }

    /// True when the box has positive size and lies entirely inside the frame.
    pub fn is_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= frame_width as f32
            && self.y + self.height <= frame_height as f32
    }

    pub fn ensure_within(&self, frame_width: u32, frame_height: u32) -> Result<(), InputError> {
        if self.is_within(frame_width, frame_height) {
            Ok(())
        } else {
            Err(InputError::BoxOutOfBounds {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                frame_width,
                frame_height,
            })
        }
    }

    /// Integer pixel span `(x1, y1, x2, y2)` clamped to the frame, end-exclusive.
    pub fn pixel_span(&self, frame_width: u32, frame_height: u32) -> (usize, usize, usize, usize) {
        let clamp = |v: f32, max: u32| v.max(0.0).min(max as f32) as usize;
        let x1 = clamp(self.x.floor(), frame_width);
        let y1 = clamp(self.y.floor(), frame_height);
        let x2 = clamp((self.x + self.width).ceil(), frame_width);
        let y2 = clamp((self.y + self.height).ceil(), frame_height);
        (x1, y1, x2.max(x1), y2.max(y1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_iou_identical_boxes() {
        let a = BoundingBox::new(10.0, 10.0, 100.0, 100.0);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        // intersection 50*100 = 5000, union 10000 + 10000 - 5000 = 15000
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let b = BoundingBox::new(50.0, 0.0, 100.0, 100.0);
        assert_relative_eq!(a.iou(&b), 5000.0 / 15000.0);
    }

    #[test]
    fn test_iou_touching_edges() {
        let a = BoundingBox::new(0.0, 0.0, 50.0, 50.0);
        let b = BoundingBox::new(50.0, 0.0, 50.0, 50.0);
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[rstest]
    #[case::inside(BoundingBox::new(10.0, 10.0, 20.0, 20.0), true)]
    #[case::touching_far_edge(BoundingBox::new(80.0, 80.0, 20.0, 20.0), true)]
    #[case::negative_origin(BoundingBox::new(-1.0, 10.0, 20.0, 20.0), false)]
    #[case::past_right_edge(BoundingBox::new(90.0, 10.0, 20.0, 20.0), false)]
    #[case::zero_width(BoundingBox::new(10.0, 10.0, 0.0, 20.0), false)]
    fn test_is_within(#[case] bbox: BoundingBox, #[case] expected: bool) {
        assert_eq!(bbox.is_within(100, 100), expected);
    }

    #[test]
    fn test_ensure_within_reports_frame_size() {
        let err = BoundingBox::new(90.0, 0.0, 20.0, 20.0)
            .ensure_within(100, 50)
            .unwrap_err();
        assert!(matches!(
            err,
            InputError::BoxOutOfBounds {
                frame_width: 100,
                frame_height: 50,
                ..
            }
        ));
    }

    #[test]
    fn test_pixel_span_clamps_to_frame() {
        let bbox = BoundingBox::new(-5.0, 2.5, 20.0, 200.0);
        assert_eq!(bbox.pixel_span(10, 10), (0, 2, 10, 10));
    }
}
