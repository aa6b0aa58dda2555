use std::time::Instant;

use crate::face::domain::face_analysis::{FaceAnalysisOutput, FaceStages};
use crate::face::domain::localizer::LocalizationOutput;
use crate::pipeline::face_branch_executor::{FaceBranchExecutor, FaceJob};
use crate::pipeline::infrastructure::threaded_face_branch_executor::ThreadedFaceBranchExecutor;
use crate::pipeline::pipeline_logger::{
    NullPipelineLogger, PipelineLogger, DETECTED_FACES_METRIC,
};
use crate::shared::biometric::BiometricModel;
use crate::shared::config::FaceAnalysisConfig;
use crate::shared::error::{SensingError, Stage};
use crate::shared::frame::Frame;

/// Face analysis pipeline: validate → localize → per-face branches → aggregate.
///
/// Localization failure fails the whole call. Everything after it fails
/// per face and per branch, inside the returned output.
pub struct FaceAnalysisUseCase {
    stages: FaceStages,
    executor: Box<dyn FaceBranchExecutor>,
    config: FaceAnalysisConfig,
    logger: Box<dyn PipelineLogger>,
}

impl FaceAnalysisUseCase {
    pub fn new(
        stages: FaceStages,
        executor: Box<dyn FaceBranchExecutor>,
        config: FaceAnalysisConfig,
    ) -> Self {
        Self {
            stages,
            executor,
            config,
            logger: Box::new(NullPipelineLogger),
        }
    }

    /// Uses a threaded executor sized from `config.max_workers`.
    pub fn from_config(stages: FaceStages, config: FaceAnalysisConfig) -> Self {
        let executor = ThreadedFaceBranchExecutor::new(config.worker_count());
        Self::new(stages, Box::new(executor), config)
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Localization alone.
    pub fn localize(&self, frame: &Frame) -> Result<LocalizationOutput, SensingError> {
        frame.validate()?;
        let boxes = self
            .stages
            .localizer
            .localize(frame, self.config.localization_algorithm)
            .map_err(|e| SensingError::stage(Stage::Localization, e))?;
        Ok(LocalizationOutput::new(boxes))
    }

    pub fn execute(
        &mut self,
        frame: &Frame,
        models: &[BiometricModel],
    ) -> Result<FaceAnalysisOutput, SensingError> {
        let start = Instant::now();
        let faces = self.localize(frame)?;
        self.logger
            .timing(Stage::Localization, start.elapsed().as_secs_f64() * 1000.0);
        log::debug!(
            "Frame {}: {} faces localized",
            frame.index(),
            faces.detected_face_count()
        );

        let job = FaceJob {
            frame,
            stages: &self.stages,
            models,
            headpose_mode: self.config.headpose_mode,
        };
        let reports = self.executor.execute(&job, faces.face_locations());

        for report in &reports {
            for (stage, ms) in &report.timings {
                self.logger.timing(*stage, *ms);
            }
        }
        self.logger
            .metric(DETECTED_FACES_METRIC, faces.detected_face_count() as f64);

        FaceAnalysisOutput::from_reports(faces, reports)
            .map_err(|e| SensingError::Internal(e.to_string()))
    }

    pub fn summary(&self) {
        self.logger.summary();
    }
}
