use crate::shared::emotion::EmotionScores;
use crate::shared::error::StageError;
use crate::voice::domain::audio_clip::AudioClip;
use crate::voice::domain::pitch::VoicePitchOutput;

/// Stress level in [0, 1] plus an emotion distribution for one clip.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoiceTone {
    pub stress_level: f32,
    pub emotions: EmotionScores,
}

/// Classifies tone from a clip and its already-computed pitch track.
pub trait ToneDetector: Send + Sync {
    fn detect(&self, clip: &AudioClip, pitch: &VoicePitchOutput) -> Result<VoiceTone, StageError>;
}
