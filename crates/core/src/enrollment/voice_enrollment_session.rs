use std::sync::Arc;

use crate::enrollment::domain::enrollment::{EnrollmentError, EnrollmentState, SubmitOutcome};
use crate::enrollment::domain::voice_enrollment::VoiceEnrollmentStatus;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::biometric::BiometricModel;
use crate::shared::config::VoiceEnrollmentConfig;
use crate::shared::error::StageError;
use crate::voice::domain::audio_clip::AudioClip;
use crate::voice::domain::template_encoder::VoiceTemplateEncoder;

pub type VoiceSubmitOutcome = SubmitOutcome<BiometricModel, VoiceEnrollmentStatus>;

/// Builds one voice template from `target_samples` clips of one speaker.
///
/// Any failure ends the session with `InternalError`.
pub struct VoiceEnrollmentSession {
    identity: String,
    encoder: Arc<dyn VoiceTemplateEncoder>,
    config: VoiceEnrollmentConfig,
    samples: Vec<Vec<f32>>,
    state: EnrollmentState<VoiceEnrollmentStatus>,
    logger: Box<dyn PipelineLogger>,
}

impl VoiceEnrollmentSession {
    pub fn new(
        identity: impl Into<String>,
        encoder: Arc<dyn VoiceTemplateEncoder>,
        config: VoiceEnrollmentConfig,
    ) -> Result<Self, EnrollmentError> {
        let identity = identity.into();
        if identity.trim().is_empty() {
            return Err(EnrollmentError::EmptyIdentity);
        }
        config.validate()?;
        log::info!("Voice enrollment started for {identity:?}");
        Ok(Self {
            identity,
            encoder,
            config,
            samples: Vec::new(),
            state: EnrollmentState::Collecting { accepted: 0 },
            logger: Box::new(NullPipelineLogger),
        })
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// One-shot enrollment over a batch of clips.
    pub fn enroll_batch<'c>(
        identity: impl Into<String>,
        encoder: Arc<dyn VoiceTemplateEncoder>,
        config: VoiceEnrollmentConfig,
        clips: impl IntoIterator<Item = &'c AudioClip>,
    ) -> Result<Result<BiometricModel, VoiceEnrollmentStatus>, EnrollmentError> {
        let mut session = Self::new(identity, encoder, config)?;
        for clip in clips {
            match session.submit(clip)? {
                SubmitOutcome::Continue { .. } => continue,
                SubmitOutcome::Success(model) => return Ok(Ok(model)),
                SubmitOutcome::Failed(status) => return Ok(Err(status)),
            }
        }
        match session.finish()? {
            SubmitOutcome::Success(model) => Ok(Ok(model)),
            SubmitOutcome::Failed(status) => Ok(Err(status)),
            SubmitOutcome::Continue { .. } => Ok(Err(VoiceEnrollmentStatus::InternalError)),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn state(&self) -> EnrollmentState<VoiceEnrollmentStatus> {
        self.state
    }

    pub fn submit(&mut self, clip: &AudioClip) -> Result<VoiceSubmitOutcome, EnrollmentError> {
        self.ensure_open()?;

        let sample = clip
            .validate()
            .map_err(StageError::from)
            .and_then(|()| self.encoder.sample(clip));
        match sample {
            Ok(sample) => self.samples.push(sample),
            Err(e) => {
                log::warn!("Voice enrollment {:?}: clip {} rejected: {e}", self.identity, clip.index());
                return Ok(self.fail());
            }
        }

        let accepted = self.samples.len();
        self.logger.progress(accepted, self.config.target_samples);
        if accepted >= self.config.target_samples {
            return Ok(self.finalize());
        }
        self.state = EnrollmentState::Collecting { accepted };
        Ok(SubmitOutcome::Continue { accepted })
    }

    /// Finalizes early. Succeeds with at least one accepted clip.
    pub fn finish(&mut self) -> Result<VoiceSubmitOutcome, EnrollmentError> {
        self.ensure_open()?;
        if self.samples.is_empty() {
            log::info!("Voice enrollment {:?}: no clips accepted", self.identity);
            return Ok(self.fail());
        }
        Ok(self.finalize())
    }

    fn finalize(&mut self) -> VoiceSubmitOutcome {
        self.state = EnrollmentState::Finalizing;
        match self.encoder.build(&self.identity, &self.samples) {
            Ok(model) => {
                self.state = EnrollmentState::Succeeded;
                self.logger.info(&format!(
                    "Voice enrollment for {:?} succeeded with {} clips",
                    self.identity,
                    self.samples.len()
                ));
                log::info!("Voice enrollment for {:?} succeeded", self.identity);
                self.samples.clear();
                SubmitOutcome::Success(model)
            }
            Err(e) => {
                log::warn!("Voice enrollment {:?}: template build failed: {e}", self.identity);
                self.fail()
            }
        }
    }

    fn fail(&mut self) -> VoiceSubmitOutcome {
        let status = VoiceEnrollmentStatus::InternalError;
        log::info!("Voice enrollment for {:?} failed: {status}", self.identity);
        self.state = EnrollmentState::Failed(status);
        self.samples.clear();
        SubmitOutcome::Failed(status)
    }

    fn ensure_open(&self) -> Result<(), EnrollmentError> {
        if self.state.is_terminal() {
            return Err(EnrollmentError::SessionClosed {
                identity: self.identity.clone(),
                state: self.state.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::biometric::Modality;
    use crate::voice::infrastructure::cosine_voice_matcher::CosineVoiceMatcher;
    use crate::voice::infrastructure::spectral_embedding_extractor::SpectralEmbeddingExtractor;

    fn encoder() -> Arc<dyn VoiceTemplateEncoder> {
        Arc::new(CosineVoiceMatcher::new(SpectralEmbeddingExtractor::new()))
    }

    fn clip(index: usize) -> AudioClip {
        AudioClip::tone(180.0 + index as f32, 0.25, 16000, 0.5, index)
    }

    fn config(target_samples: usize) -> VoiceEnrollmentConfig {
        VoiceEnrollmentConfig { target_samples }
    }

    #[test]
    fn test_target_clips_produce_one_model() {
        let mut s = VoiceEnrollmentSession::new("alice", encoder(), config(2)).unwrap();
        assert_eq!(s.submit(&clip(0)).unwrap(), SubmitOutcome::Continue { accepted: 1 });

        let SubmitOutcome::Success(model) = s.submit(&clip(1)).unwrap() else {
            panic!("expected success");
        };
        assert_eq!(model.id(), "alice");
        assert_eq!(model.modality(), Modality::Voice);
        assert_eq!(s.state(), EnrollmentState::Succeeded);
    }

    #[test]
    fn test_single_clip_then_finish_succeeds() {
        let mut s = VoiceEnrollmentSession::new("bob", encoder(), config(3)).unwrap();
        s.submit(&clip(0)).unwrap();
        assert!(matches!(s.finish().unwrap(), SubmitOutcome::Success(_)));
    }

    #[test]
    fn test_empty_clip_fails_session() {
        let mut s = VoiceEnrollmentSession::new("carol", encoder(), config(3)).unwrap();
        let empty = AudioClip::new(Vec::new(), 16000, 1, 0);
        assert_eq!(
            s.submit(&empty).unwrap(),
            SubmitOutcome::Failed(VoiceEnrollmentStatus::InternalError)
        );
        assert!(matches!(
            s.submit(&clip(1)),
            Err(EnrollmentError::SessionClosed { .. })
        ));
    }

    #[test]
    fn test_finish_without_clips_fails() {
        let mut s = VoiceEnrollmentSession::new("dave", encoder(), config(3)).unwrap();
        assert_eq!(
            s.finish().unwrap(),
            SubmitOutcome::Failed(VoiceEnrollmentStatus::InternalError)
        );
    }

    #[test]
    fn test_enroll_batch() {
        let clips: Vec<AudioClip> = (0..5).map(clip).collect();
        let model = VoiceEnrollmentSession::enroll_batch("erin", encoder(), config(3), &clips)
            .unwrap()
            .unwrap();
        assert_eq!(model.id(), "erin");
    }

    #[test]
    fn test_zero_target_is_invalid() {
        assert!(matches!(
            VoiceEnrollmentSession::new("frank", encoder(), config(0)),
            Err(EnrollmentError::InvalidConfig(_))
        ));
    }
}
