use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::shared::error::StageError;
use crate::voice::domain::audio_clip::AudioClip;
use crate::voice::domain::pitch::{PitchDetector, PitchTrack};

/// Analysis window size in samples.
pub const DEFAULT_WINDOW_SIZE: usize = 2048;

/// Hop size between successive windows.
pub const DEFAULT_HOP_SIZE: usize = 512;

pub const DEFAULT_MIN_HZ: f32 = 60.0;
pub const DEFAULT_MAX_HZ: f32 = 500.0;

/// Normalized autocorrelation peak below which a window counts as unvoiced.
pub const DEFAULT_VOICING_THRESHOLD: f32 = 0.45;

/// Windows quieter than this RMS are unvoiced without further analysis.
const SILENCE_RMS: f64 = 1e-4;

/// Autocorrelation pitch detector.
///
/// Each window's autocorrelation is computed through the power spectrum
/// (FFT, |X|², inverse FFT) over a zero-padded buffer. The strongest peak in
/// the `[min_hz, max_hz]` lag range is refined by parabolic interpolation.
/// Windows are evaluated only as the returned track is consumed.
pub struct FftPitchDetector {
    window_size: usize,
    hop_size: usize,
    min_hz: f32,
    max_hz: f32,
    voicing_threshold: f32,
}

impl FftPitchDetector {
    pub fn new() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            hop_size: DEFAULT_HOP_SIZE,
            min_hz: DEFAULT_MIN_HZ,
            max_hz: DEFAULT_MAX_HZ,
            voicing_threshold: DEFAULT_VOICING_THRESHOLD,
        }
    }

    pub fn with_window(mut self, window_size: usize, hop_size: usize) -> Self {
        self.window_size = window_size.max(2);
        self.hop_size = hop_size.max(1);
        self
    }

    pub fn with_range(mut self, min_hz: f32, max_hz: f32) -> Self {
        self.min_hz = min_hz;
        self.max_hz = max_hz;
        self
    }

    /// Number of windows a clip of `len` mono samples produces.
    pub fn window_count(&self, len: usize) -> usize {
        if len == 0 {
            0
        } else if len < self.window_size {
            1
        } else {
            (len - self.window_size) / self.hop_size + 1
        }
    }
}

impl Default for FftPitchDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PitchDetector for FftPitchDetector {
    fn detect<'a>(&'a self, clip: &'a AudioClip) -> Result<PitchTrack<'a>, StageError> {
        clip.validate()?;
        if !(self.min_hz > 0.0 && self.max_hz > self.min_hz) {
            return Err(StageError::internal(format!(
                "invalid pitch range {}..{} Hz",
                self.min_hz, self.max_hz
            )));
        }

        let samples = clip.mono();
        let window = self.window_size.min(samples.len());
        let fft_len = (2 * window).next_power_of_two();

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);

        let sample_rate = clip.sample_rate() as f32;
        let min_lag = ((sample_rate / self.max_hz).floor() as usize).max(1);
        let max_lag = ((sample_rate / self.min_hz).ceil() as usize).min(window.saturating_sub(2));
        let windows = self.window_count(samples.len());
        let estimator = WindowEstimator {
            forward,
            inverse,
            fft_len,
            min_lag,
            max_lag,
            sample_rate,
            voicing_threshold: self.voicing_threshold,
        };

        log::debug!(
            "Pitch detection: {windows} windows of {window} samples, lags {min_lag}..{max_lag}"
        );

        let hop = self.hop_size;
        Ok(PitchTrack::new((0..windows).map(move |w| {
            let start = w * hop;
            estimator.estimate(&samples[start..start + window])
        })))
    }
}

struct WindowEstimator {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    fft_len: usize,
    min_lag: usize,
    max_lag: usize,
    sample_rate: f32,
    voicing_threshold: f32,
}

impl WindowEstimator {
    fn estimate(&self, window: &[f32]) -> f32 {
        if self.min_lag + 1 >= self.max_lag {
            return 0.0;
        }

        let n = window.len() as f64;
        let mean = window.iter().map(|s| *s as f64).sum::<f64>() / n;
        let energy = window.iter().map(|s| (*s as f64 - mean).powi(2)).sum::<f64>() / n;
        if energy.sqrt() < SILENCE_RMS {
            return 0.0;
        }

        let mut buf: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); self.fft_len];
        for (slot, s) in buf.iter_mut().zip(window) {
            *slot = Complex::new(*s as f64 - mean, 0.0);
        }
        self.forward.process(&mut buf);
        for c in buf.iter_mut() {
            *c = Complex::new(c.norm_sqr(), 0.0);
        }
        self.inverse.process(&mut buf);

        // rustfft does not normalize; the scale cancels against r[0].
        let r0 = buf[0].re;
        if r0 <= 0.0 {
            return 0.0;
        }
        let r = |lag: usize| buf[lag].re / r0;

        let mut best_lag = self.min_lag;
        let mut best = f64::MIN;
        for lag in self.min_lag..=self.max_lag {
            let v = r(lag);
            if v > best {
                best = v;
                best_lag = lag;
            }
        }

        if best < self.voicing_threshold as f64
            || best_lag == self.min_lag
            || best_lag == self.max_lag
        {
            return 0.0;
        }

        let (y0, y1, y2) = (r(best_lag - 1), best, r(best_lag + 1));
        let denom = y0 - 2.0 * y1 + y2;
        let offset = if denom.abs() > 1e-12 {
            (0.5 * (y0 - y2) / denom).clamp(-0.5, 0.5)
        } else {
            0.0
        };

        (self.sample_rate as f64 / (best_lag as f64 + offset)) as f32
    }
}
