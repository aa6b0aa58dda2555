use crate::shared::biometric::{AuthenticationOutput, BiometricModel, Modality};
use crate::shared::error::StageError;
use crate::shared::template_matcher::{build_template, score_templates};
use crate::voice::domain::audio_clip::AudioClip;
use crate::voice::domain::authenticator::VoiceAuthenticator;
use crate::voice::domain::template_encoder::{VoiceEmbeddingExtractor, VoiceTemplateEncoder};

pub struct CosineVoiceMatcher<E> {
    extractor: E,
}

impl<E: VoiceEmbeddingExtractor> CosineVoiceMatcher<E> {
    pub fn new(extractor: E) -> Self {
        Self { extractor }
    }
}

impl<E: VoiceEmbeddingExtractor> VoiceAuthenticator for CosineVoiceMatcher<E> {
    fn authenticate(
        &self,
        clip: &AudioClip,
        models: &[BiometricModel],
    ) -> Result<AuthenticationOutput, StageError> {
        if models.is_empty() {
            return Ok(AuthenticationOutput::default());
        }
        let query = self.extractor.extract(clip)?;
        score_templates(&query, models, Modality::Voice)
    }
}

impl<E: VoiceEmbeddingExtractor> VoiceTemplateEncoder for CosineVoiceMatcher<E> {
    fn sample(&self, clip: &AudioClip) -> Result<Vec<f32>, StageError> {
        self.extractor.extract(clip)
    }

    fn build(&self, identity: &str, samples: &[Vec<f32>]) -> Result<BiometricModel, StageError> {
        build_template(identity, Modality::Voice, samples)
    }
}
