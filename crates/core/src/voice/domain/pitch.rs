use crate::shared::error::StageError;
use crate::voice::domain::audio_clip::AudioClip;

/// Lazy sequence of pitch estimates in Hz, one per analysis window, in
/// time order. Unvoiced windows yield `0.0`.
///
/// Finite and consumed once; borrows the clip it was produced from.
pub struct PitchTrack<'a> {
    inner: Box<dyn Iterator<Item = f32> + 'a>,
}

impl<'a> PitchTrack<'a> {
    pub fn new(inner: impl Iterator<Item = f32> + 'a) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Drains the track into an owned output.
    pub fn into_output(self) -> VoicePitchOutput {
        VoicePitchOutput {
            hertz: self.collect(),
        }
    }
}

impl Iterator for PitchTrack<'_> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

pub trait PitchDetector: Send + Sync {
    fn detect<'a>(&'a self, clip: &'a AudioClip) -> Result<PitchTrack<'a>, StageError>;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoicePitchOutput {
    pub hertz: Vec<f32>,
}

impl VoicePitchOutput {
    pub fn new(hertz: Vec<f32>) -> Self {
        Self { hertz }
    }

    pub fn voiced(&self) -> impl Iterator<Item = f32> + '_ {
        self.hertz.iter().copied().filter(|hz| *hz > 0.0)
    }

    pub fn voiced_fraction(&self) -> f32 {
        if self.hertz.is_empty() {
            return 0.0;
        }
        self.voiced().count() as f32 / self.hertz.len() as f32
    }

    /// Mean and standard deviation of the voiced windows.
    pub fn voiced_stats(&self) -> Option<(f32, f32)> {
        let voiced: Vec<f32> = self.voiced().collect();
        if voiced.is_empty() {
            return None;
        }
        let n = voiced.len() as f32;
        let mean = voiced.iter().sum::<f32>() / n;
        let var = voiced.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
        Some((mean, var.sqrt()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_track_is_consumed_lazily() {
        let mut calls = 0;
        let mut track = PitchTrack::new((0..5).map(|i| {
            calls += 1;
            i as f32
        }));
        assert_eq!(track.next(), Some(0.0));
        drop(track);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_into_output_keeps_order() {
        let out = PitchTrack::new(vec![100.0, 0.0, 120.0].into_iter()).into_output();
        assert_eq!(out.hertz, vec![100.0, 0.0, 120.0]);
    }

    #[test]
    fn test_voiced_stats_skip_unvoiced_windows() {
        let out = VoicePitchOutput::new(vec![100.0, 0.0, 200.0, 0.0]);
        let (mean, std) = out.voiced_stats().unwrap();
        assert_relative_eq!(mean, 150.0);
        assert_relative_eq!(std, 50.0);
        assert_relative_eq!(out.voiced_fraction(), 0.5);
    }

    #[test]
    fn test_silence_has_no_stats() {
        assert!(VoicePitchOutput::new(vec![0.0; 3]).voiced_stats().is_none());
        assert_eq!(VoicePitchOutput::default().voiced_fraction(), 0.0);
    }
}
