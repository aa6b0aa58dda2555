use crate::shared::emotion::EmotionScores;
use crate::shared::error::StageError;
use crate::voice::domain::audio_clip::AudioClip;
use crate::voice::domain::pitch::VoicePitchOutput;
use crate::voice::domain::tone::{ToneDetector, VoiceTone};

/// Speaking pitch treated as relaxed.
pub const DEFAULT_BASELINE_HZ: f32 = 150.0;

/// Coefficient of variation of voiced pitch that counts as fully agitated.
const MAX_VARIATION: f32 = 0.25;

/// Heuristic tone classifier over the pitch contour.
///
/// Stress blends pitch variability (coefficient of variation across voiced
/// windows) with pitch elevation above a baseline. The emotion vector
/// splits that stress between anger (elevated), fear (unstable) and
/// surprise, with the remainder as neutral, and sums to one.
pub struct PitchContourToneDetector {
    baseline_hz: f32,
}

impl PitchContourToneDetector {
    pub fn new() -> Self {
        Self {
            baseline_hz: DEFAULT_BASELINE_HZ,
        }
    }

    pub fn with_baseline(baseline_hz: f32) -> Self {
        Self { baseline_hz }
    }
}

impl Default for PitchContourToneDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ToneDetector for PitchContourToneDetector {
    fn detect(&self, clip: &AudioClip, pitch: &VoicePitchOutput) -> Result<VoiceTone, StageError> {
        clip.validate()?;
        if self.baseline_hz <= 0.0 {
            return Err(StageError::internal("baseline pitch must be positive"));
        }

        let Some((mean, std)) = pitch.voiced_stats() else {
            return Ok(VoiceTone {
                stress_level: 0.0,
                emotions: EmotionScores {
                    neutral: 1.0,
                    ..Default::default()
                },
            });
        };

        let variability = (std / mean / MAX_VARIATION).clamp(0.0, 1.0);
        let elevation = ((mean - self.baseline_hz) / self.baseline_hz).clamp(0.0, 1.0);
        let stress = (0.6 * variability + 0.4 * elevation).clamp(0.0, 1.0);

        let anger = stress * elevation;
        let fear = stress * (1.0 - elevation) * variability;
        let surprise = stress - anger - fear;
        let emotions = EmotionScores {
            anger,
            fear,
            surprise: surprise.max(0.0),
            neutral: 1.0 - stress,
            ..Default::default()
        };

        Ok(VoiceTone {
            stress_level: stress,
            emotions,
        })
    }
}
