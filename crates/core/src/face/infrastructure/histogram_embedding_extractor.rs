/// Colour-histogram face embedding.
///
/// A model-free fallback extractor: RGB crops become a 2D hue-saturation
/// histogram, IR crops an intensity histogram of the same length, so
/// templates from either format share one embedding size.
use crate::face::domain::template_encoder::FaceEmbeddingExtractor;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::embedding::l2_normalize;
use crate::shared::error::{InputError, StageError};
use crate::shared::frame::{Frame, ImageFormat};

const HUE_BINS: usize = 16;
const SAT_BINS: usize = 16;

pub const EMBEDDING_SIZE: usize = HUE_BINS * SAT_BINS;

#[derive(Default)]
pub struct HistogramEmbeddingExtractor;

impl HistogramEmbeddingExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FaceEmbeddingExtractor for HistogramEmbeddingExtractor {
    fn extract(&self, frame: &Frame, bbox: &BoundingBox) -> Result<Vec<f32>, StageError> {
        bbox.ensure_within(frame.width(), frame.height())?;
        let pixels = frame.as_ndarray()?;
        let (x1, y1, x2, y2) = bbox.pixel_span(frame.width(), frame.height());
        if x2 == x1 || y2 == y1 {
            return Err(InputError::MalformedFrame("empty face crop".into()).into());
        }

        let mut hist = vec![0.0f32; EMBEDDING_SIZE];
        for row in y1..y2 {
            for col in x1..x2 {
                let bin = match frame.format() {
                    ImageFormat::Rgb => {
                        let (h, s, _v) = rgb_to_hsv(
                            pixels[[row, col, 0]] as f32 / 255.0,
                            pixels[[row, col, 1]] as f32 / 255.0,
                            pixels[[row, col, 2]] as f32 / 255.0,
                        );
                        let h_bin = ((h / 360.0) * HUE_BINS as f32).min(HUE_BINS as f32 - 1.0) as usize;
                        let s_bin = (s * SAT_BINS as f32).min(SAT_BINS as f32 - 1.0) as usize;
                        h_bin * SAT_BINS + s_bin
                    }
                    ImageFormat::Ir => {
                        let v = pixels[[row, col, 0]] as usize;
                        v * EMBEDDING_SIZE / 256
                    }
                };
                hist[bin] += 1.0;
            }
        }

        l2_normalize(&mut hist);
        Ok(hist)
    }
}

fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { delta / max } else { 0.0 };

    let h = if delta == 0.0 {
        0.0
    } else if (max - r).abs() < f32::EPSILON {
        60.0 * (((g - b) / delta) % 6.0)
    } else if (max - g).abs() < f32::EPSILON {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let h = if h < 0.0 { h + 360.0 } else { h };
    (h, s, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::embedding::cosine_similarity;
    use approx::assert_relative_eq;

    fn solid(r: u8, g: u8, b: u8) -> Frame {
        let data = [r, g, b].repeat(40 * 40);
        Frame::new(data, 40, 40, ImageFormat::Rgb, 0)
    }

    fn crop() -> BoundingBox {
        BoundingBox::new(10.0, 10.0, 20.0, 20.0)
    }

    #[test]
    fn test_embedding_is_unit_length() {
        let e = HistogramEmbeddingExtractor::new()
            .extract(&solid(200, 40, 40), &crop())
            .unwrap();
        assert_eq!(e.len(), EMBEDDING_SIZE);
        assert_relative_eq!(cosine_similarity(&e, &e), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_same_colour_matches_different_colour_does_not() {
        let x = HistogramEmbeddingExtractor::new();
        let red = x.extract(&solid(200, 40, 40), &crop()).unwrap();
        let red2 = x.extract(&solid(201, 41, 40), &crop()).unwrap();
        let blue = x.extract(&solid(40, 40, 200), &crop()).unwrap();
        assert!(cosine_similarity(&red, &red2) > 0.99);
        assert!(cosine_similarity(&red, &blue) < 0.01);
    }

    #[test]
    fn test_ir_frames_share_embedding_size() {
        let frame = Frame::filled(128, 40, 40, ImageFormat::Ir, 0);
        let e = HistogramEmbeddingExtractor::new().extract(&frame, &crop()).unwrap();
        assert_eq!(e.len(), EMBEDDING_SIZE);
    }

    #[test]
    fn test_out_of_bounds_box_is_input_error() {
        let err = HistogramEmbeddingExtractor::new()
            .extract(&solid(0, 0, 0), &BoundingBox::new(30.0, 30.0, 20.0, 20.0))
            .unwrap_err();
        assert!(matches!(err, StageError::Input(InputError::BoxOutOfBounds { .. })));
    }

    #[test]
    fn test_rgb_to_hsv_pure_red() {
        let (h, s, v) = rgb_to_hsv(1.0, 0.0, 0.0);
        assert_relative_eq!(h, 0.0);
        assert_relative_eq!(s, 1.0);
        assert_relative_eq!(v, 1.0);
    }
}
