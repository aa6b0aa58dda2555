use crate::enrollment::domain::enrollment::{EnrollmentError, EnrollmentState, SubmitOutcome};
use crate::enrollment::domain::face_enrollment::{
    FaceEnrollmentOutput, FaceEnrollmentStages, FaceEnrollmentStatus,
};
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::config::FaceEnrollmentConfig;
use crate::shared::emotion::EmotionScores;
use crate::shared::error::{Stage, StageError};
use crate::shared::frame::Frame;

pub type FaceSubmitOutcome = SubmitOutcome<FaceEnrollmentOutput, FaceEnrollmentStatus>;

/// Builds one face template for one identity from a sequence of frames.
///
/// Each submission must show exactly one face overlapping the caller's box.
/// The first rejected frame or stage failure ends the session with a
/// terminal status. Reaching `target_samples` finalizes automatically;
/// [`finish`](Self::finish) finalizes early once `min_samples` are in.
pub struct FaceEnrollmentSession {
    identity: String,
    stages: FaceEnrollmentStages,
    config: FaceEnrollmentConfig,
    samples: Vec<Vec<f32>>,
    emotions: Vec<EmotionScores>,
    state: EnrollmentState<FaceEnrollmentStatus>,
    logger: Box<dyn PipelineLogger>,
}

impl FaceEnrollmentSession {
    pub fn new(
        identity: impl Into<String>,
        stages: FaceEnrollmentStages,
        config: FaceEnrollmentConfig,
    ) -> Result<Self, EnrollmentError> {
        let identity = identity.into();
        if identity.trim().is_empty() {
            return Err(EnrollmentError::EmptyIdentity);
        }
        config.validate()?;
        log::info!("Face enrollment started for {identity:?}");
        Ok(Self {
            identity,
            stages,
            config,
            samples: Vec::new(),
            emotions: Vec::new(),
            state: EnrollmentState::Collecting { accepted: 0 },
            logger: Box::new(NullPipelineLogger),
        })
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// One-shot enrollment over a batch of frames and boxes.
    ///
    /// Stops at the first terminal outcome; frames past `target_samples`
    /// are not examined. A batch that ends early is finished as by
    /// [`finish`](Self::finish).
    pub fn enroll_batch<'f>(
        identity: impl Into<String>,
        stages: FaceEnrollmentStages,
        config: FaceEnrollmentConfig,
        inputs: impl IntoIterator<Item = (&'f Frame, BoundingBox)>,
    ) -> Result<Result<FaceEnrollmentOutput, FaceEnrollmentStatus>, EnrollmentError> {
        let mut session = Self::new(identity, stages, config)?;
        for (frame, bbox) in inputs {
            match session.submit(frame, bbox)? {
                SubmitOutcome::Continue { .. } => continue,
                SubmitOutcome::Success(output) => return Ok(Ok(output)),
                SubmitOutcome::Failed(status) => return Ok(Err(status)),
            }
        }
        match session.finish()? {
            SubmitOutcome::Success(output) => Ok(Ok(output)),
            SubmitOutcome::Failed(status) => Ok(Err(status)),
            SubmitOutcome::Continue { .. } => Ok(Err(FaceEnrollmentStatus::InternalError)),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn state(&self) -> EnrollmentState<FaceEnrollmentStatus> {
        self.state
    }

    pub fn accepted(&self) -> usize {
        self.samples.len()
    }

    pub fn submit(
        &mut self,
        frame: &Frame,
        bbox: BoundingBox,
    ) -> Result<FaceSubmitOutcome, EnrollmentError> {
        self.ensure_open()?;

        if let Err(status) = self.accept(frame, &bbox) {
            return Ok(self.fail(status));
        }

        let accepted = self.samples.len();
        self.logger.progress(accepted, self.config.target_samples);
        log::debug!(
            "Enrollment {:?}: accepted frame {} ({accepted}/{})",
            self.identity,
            frame.index(),
            self.config.target_samples
        );

        if accepted >= self.config.target_samples {
            return Ok(self.finalize());
        }
        self.state = EnrollmentState::Collecting { accepted };
        Ok(SubmitOutcome::Continue { accepted })
    }

    /// Finalizes with what has been accepted so far.
    pub fn finish(&mut self) -> Result<FaceSubmitOutcome, EnrollmentError> {
        self.ensure_open()?;
        if self.samples.len() < self.config.min_samples {
            log::info!(
                "Enrollment {:?}: {} of {} required frames accepted",
                self.identity,
                self.samples.len(),
                self.config.min_samples
            );
            return Ok(self.fail(FaceEnrollmentStatus::NotEnoughFacesDetected));
        }
        Ok(self.finalize())
    }

    fn accept(&mut self, frame: &Frame, bbox: &BoundingBox) -> Result<(), FaceEnrollmentStatus> {
        if let Err(e) = frame.validate() {
            log::warn!("Enrollment {:?}: {e}", self.identity);
            return Err(FaceEnrollmentStatus::InternalError);
        }

        let boxes = self
            .stages
            .localizer
            .localize(frame, self.config.localization_algorithm)
            .map_err(|e| self.stage_failure(Stage::Localization, &e))?;

        let face = match boxes.as_slice() {
            [] => return Err(FaceEnrollmentStatus::NoFaceDetected),
            [face] => *face,
            _ => {
                log::info!(
                    "Enrollment {:?}: {} faces in frame {}",
                    self.identity,
                    boxes.len(),
                    frame.index()
                );
                return Err(FaceEnrollmentStatus::MultipleFacesDetected);
            }
        };

        let overlap = face.iou(bbox);
        if overlap < self.config.match_iou_threshold {
            log::info!(
                "Enrollment {:?}: detected face overlaps the requested box by {overlap:.2}",
                self.identity
            );
            return Err(FaceEnrollmentStatus::NoFaceDetected);
        }

        face.ensure_within(frame.width(), frame.height())
            .map_err(|e| self.stage_failure(Stage::Landmark, &e.into()))?;
        let landmarks = self
            .stages
            .landmarks
            .detect(frame, &face)
            .map_err(|e| self.stage_failure(Stage::Landmark, &e))?;

        let emotion = self
            .stages
            .emotion
            .recognize(frame, &landmarks, &face)
            .and_then(|scores| {
                if scores.is_valid() {
                    Ok(scores)
                } else {
                    Err(StageError::internal("emotion scores must be finite and non-negative"))
                }
            })
            .map_err(|e| self.stage_failure(Stage::Emotion, &e))?;

        let sample = self
            .stages
            .encoder
            .sample(frame, &face)
            .map_err(|e| self.stage_failure(Stage::Enrollment, &e))?;

        self.samples.push(sample);
        self.emotions.push(emotion);
        Ok(())
    }

    fn stage_failure(&self, stage: Stage, err: &StageError) -> FaceEnrollmentStatus {
        log::warn!("Enrollment {:?}: {stage} stage failed: {err}", self.identity);
        FaceEnrollmentStatus::from_stage_error(err)
    }

    fn finalize(&mut self) -> FaceSubmitOutcome {
        self.state = EnrollmentState::Finalizing;
        let emotions = EmotionScores::mean(&self.emotions).unwrap_or_default();

        match self.stages.encoder.build(&self.identity, &self.samples) {
            Ok(model) => {
                self.state = EnrollmentState::Succeeded;
                self.samples.clear();
                self.logger.info(&format!(
                    "Face enrollment for {:?} succeeded with {} frames",
                    self.identity,
                    self.emotions.len()
                ));
                log::info!("Face enrollment for {:?} succeeded", self.identity);
                SubmitOutcome::Success(FaceEnrollmentOutput { model, emotions })
            }
            Err(e) => {
                log::warn!("Enrollment {:?}: template build failed: {e}", self.identity);
                self.fail(FaceEnrollmentStatus::InternalError)
            }
        }
    }

    fn fail(&mut self, status: FaceEnrollmentStatus) -> FaceSubmitOutcome {
        log::info!("Face enrollment for {:?} failed: {status}", self.identity);
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
