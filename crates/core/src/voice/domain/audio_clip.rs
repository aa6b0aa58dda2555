use std::borrow::Cow;
use std::f32::consts::PI;

use crate::shared::error::InputError;

/// A captured audio clip: interleaved PCM samples normalized to [-1.0, 1.0].
///
/// Owned by the caller; stages only ever borrow it.
#[derive(Clone, Debug)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    index: usize,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16, index: usize) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
            index,
        }
    }

    /// A mono sine wave, mostly useful for calibration and tests.
    pub fn tone(hertz: f32, seconds: f32, sample_rate: u32, amplitude: f32, index: usize) -> Self {
        let n = (seconds * sample_rate as f32).round() as usize;
        let samples = (0..n)
            .map(|i| amplitude * (2.0 * PI * hertz * i as f32 / sample_rate as f32).sin())
            .collect();
        Self::new(samples, sample_rate, 1, index)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Checks the clip is non-empty and its layout is consistent.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.sample_rate == 0 {
            return Err(InputError::MalformedAudio("sample rate is zero".into()));
        }
        if self.channels == 0 {
            return Err(InputError::MalformedAudio("channel count is zero".into()));
        }
        if self.samples.is_empty() {
            return Err(InputError::EmptyAudio);
        }
        if self.samples.len() % self.channels as usize != 0 {
            return Err(InputError::MalformedAudio(format!(
                "{} samples do not divide into {} channels",
                self.samples.len(),
                self.channels
            )));
        }
        Ok(())
    }

    /// Channel-averaged samples. Borrows when the clip is already mono.
    pub fn mono(&self) -> Cow<'_, [f32]> {
        if self.channels <= 1 {
            return Cow::Borrowed(&self.samples);
        }
        let ch = self.channels as usize;
        Cow::Owned(
            self.samples
                .chunks_exact(ch)
                .map(|frame| frame.iter().sum::<f32>() / ch as f32)
                .collect(),
        )
    }
}
