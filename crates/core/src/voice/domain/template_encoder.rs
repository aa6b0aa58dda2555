use crate::shared::biometric::BiometricModel;
use crate::shared::error::StageError;
use crate::voice::domain::audio_clip::AudioClip;

pub trait VoiceEmbeddingExtractor: Send + Sync {
    fn extract(&self, clip: &AudioClip) -> Result<Vec<f32>, StageError>;
}

/// Voice counterpart of the face template encoder.
pub trait VoiceTemplateEncoder: Send + Sync {
    fn sample(&self, clip: &AudioClip) -> Result<Vec<f32>, StageError>;

    fn build(&self, identity: &str, samples: &[Vec<f32>]) -> Result<BiometricModel, StageError>;
}
