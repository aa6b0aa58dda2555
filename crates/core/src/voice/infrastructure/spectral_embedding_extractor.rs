use std::f64::consts::PI;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::shared::embedding::l2_normalize;
use crate::shared::error::StageError;
use crate::voice::domain::audio_clip::AudioClip;
use crate::voice::domain::template_encoder::VoiceEmbeddingExtractor;

const FRAME_SIZE: usize = 512;
const HOP_SIZE: usize = 256;

pub const BAND_COUNT: usize = 32;

/// Long-term spectral envelope as a voice embedding.
///
/// Hann-windowed frames are transformed, their power spectra pooled into
/// equal-width bands and averaged over the clip. Log band energies are
/// mean-centred before L2 normalization.
#[derive(Default)]
pub struct SpectralEmbeddingExtractor;

impl SpectralEmbeddingExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl VoiceEmbeddingExtractor for SpectralEmbeddingExtractor {
    fn extract(&self, clip: &AudioClip) -> Result<Vec<f32>, StageError> {
        clip.validate()?;
        let samples = clip.mono();

        let mut padded;
        let samples: &[f32] = if samples.len() < FRAME_SIZE {
            padded = samples.to_vec();
            padded.resize(FRAME_SIZE, 0.0);
            &padded
        } else {
            &samples
        };

        let hann: Vec<f64> = (0..FRAME_SIZE)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / FRAME_SIZE as f64).cos()))
            .collect();
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(FRAME_SIZE);

        let half = FRAME_SIZE / 2;
        let bins_per_band = half / BAND_COUNT;
        let mut bands = vec![0.0f64; BAND_COUNT];
        let frames = (samples.len() - FRAME_SIZE) / HOP_SIZE + 1;

        let mut buf = vec![Complex::new(0.0, 0.0); FRAME_SIZE];
        for f in 0..frames {
            let start = f * HOP_SIZE;
            for (i, slot) in buf.iter_mut().enumerate() {
                *slot = Complex::new(samples[start + i] as f64 * hann[i], 0.0);
            }
            fft.process(&mut buf);
            for (band, energy) in bands.iter_mut().enumerate() {
                let lo = band * bins_per_band;
                *energy += buf[lo..lo + bins_per_band]
                    .iter()
                    .map(|c| c.norm_sqr())
                    .sum::<f64>();
            }
        }

        // Floor relative to the loudest band keeps the embedding gain-invariant.
        let peak = bands.iter().cloned().fold(0.0f64, f64::max) / frames as f64;
        let floor = peak * 1e-8 + f64::MIN_POSITIVE;
        let logs: Vec<f64> = bands
            .iter()
            .map(|e| (floor + e / frames as f64).ln())
            .collect();
        let mean = logs.iter().sum::<f64>() / BAND_COUNT as f64;
        let mut embedding: Vec<f32> = logs.iter().map(|v| (v - mean) as f32).collect();
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}
