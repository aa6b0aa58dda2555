use crate::pipeline::face_branch_executor::timed;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::biometric::{check_template_set, BiometricModel, Modality};
use crate::shared::error::{SensingError, Stage, StageError};
use crate::voice::domain::audio_clip::AudioClip;
use crate::voice::domain::pitch::PitchTrack;
use crate::voice::domain::voice_analysis::{VoiceAnalysisOutput, VoiceStages};

/// Voice analysis pipeline: pitch → tone, with authentication alongside.
pub struct VoiceAnalysisUseCase {
    stages: VoiceStages,
    logger: Box<dyn PipelineLogger>,
}

impl VoiceAnalysisUseCase {
    pub fn new(stages: VoiceStages) -> Self {
        Self {
            stages,
            logger: Box::new(NullPipelineLogger),
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Fails the whole call only for an unusable clip.
    pub fn execute(
        &mut self,
        clip: &AudioClip,
        models: &[BiometricModel],
    ) -> Result<VoiceAnalysisOutput, SensingError> {
        clip.validate()?;
        let stages = &self.stages;
        let mut timings = Vec::with_capacity(3);

        let pitch = timed(&mut timings, Stage::PitchDetection, || {
            stages.pitch.detect(clip).map(PitchTrack::into_output)
        });

        let tone = match &pitch {
            Ok(p) => timed(&mut timings, Stage::ToneDetection, || {
                let tone = stages.tone.detect(clip, p)?;
                if !(0.0..=1.0).contains(&tone.stress_level) || !tone.emotions.is_valid() {
                    return Err(StageError::internal(format!(
                        "tone output out of range (stress {})",
                        tone.stress_level
                    )));
                }
                Ok(tone)
            }),
            Err(_) => Err(StageError::Upstream {
                stage: Stage::PitchDetection,
            }),
        };

        let authentication = timed(&mut timings, Stage::Authentication, || {
            check_template_set(models, Modality::Voice)?;
            let out = stages.authenticator.authenticate(clip, models)?;
            out.verify_against(models)?;
            Ok(out)
        });

        for (stage, ms) in &timings {
            self.logger.timing(*stage, *ms);
        }
        for (stage, err) in [
            (Stage::PitchDetection, pitch.as_ref().err()),
            (Stage::ToneDetection, tone.as_ref().err()),
            (Stage::Authentication, authentication.as_ref().err()),
        ] {
            if let Some(e) = err {
                log::warn!("Clip {}: {stage} failed: {e}", clip.index());
            }
        }

        Ok(VoiceAnalysisOutput {
            pitch,
            tone,
            authentication,
        })
    }
}
