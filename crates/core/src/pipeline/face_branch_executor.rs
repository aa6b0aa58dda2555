use std::time::Instant;

use crate::face::domain::face_analysis::{FaceReport, FaceStages};
use crate::face::domain::headpose::{HeadposeInput, HeadposeMode};
use crate::shared::biometric::{check_template_set, BiometricModel, Modality};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::{Stage, StageError, StageResult};
use crate::shared::frame::Frame;

/// Everything the per-face branches of one call share, borrowed read-only.
#[derive(Clone, Copy)]
pub struct FaceJob<'a> {
    pub frame: &'a Frame,
    pub stages: &'a FaceStages,
    pub models: &'a [BiometricModel],
    pub headpose_mode: HeadposeMode,
}

/// Abstracts how the per-face branches of one call are scheduled.
///
/// Implementations must return exactly one report per box, with report `i`
/// describing `boxes[i]`, whatever order the work completes in.
pub trait FaceBranchExecutor: Send + Sync {
    fn execute(&self, job: &FaceJob<'_>, boxes: &[BoundingBox]) -> Vec<FaceReport>;
}

/// Runs each face's branches in order on the calling thread.
#[derive(Default)]
pub struct SequentialFaceBranchExecutor;

impl FaceBranchExecutor for SequentialFaceBranchExecutor {
    fn execute(&self, job: &FaceJob<'_>, boxes: &[BoundingBox]) -> Vec<FaceReport> {
        boxes.iter().map(|bbox| analyze_face(job, bbox)).collect()
    }
}

/// Drives landmark, headpose, gesture, emotion and authentication for one face.
///
/// A landmark failure turns the landmark-dependent branches into
/// `Upstream` errors. Headpose from localization and authentication only
/// need the box and still run.
pub fn analyze_face(job: &FaceJob<'_>, bbox: &BoundingBox) -> FaceReport {
    let frame = job.frame;
    let stages = job.stages;
    let mut timings = Vec::with_capacity(5);

    let landmarks = timed(&mut timings, Stage::Landmark, || {
        bbox.ensure_within(frame.width(), frame.height())?;
        stages.landmarks.detect(frame, bbox)
    });
    let upstream = || StageError::Upstream {
        stage: Stage::Landmark,
    };

    let headpose = match (job.headpose_mode, &landmarks) {
        (HeadposeMode::FromLandmarks, Ok(set)) => timed(&mut timings, Stage::Headpose, || {
            stages.headpose.estimate(frame, HeadposeInput::FromLandmarks(set))
        }),
        (HeadposeMode::FromLandmarks, Err(_)) => Err(upstream()),
        (HeadposeMode::FromLocalization, _) => timed(&mut timings, Stage::Headpose, || {
            stages.headpose.estimate(frame, HeadposeInput::FromLocalization(bbox))
        }),
    };

    let gesture = match &landmarks {
        Ok(set) => timed(&mut timings, Stage::Gesture, || stages.gesture.classify(set)),
        Err(_) => Err(upstream()),
    };

    let emotion = match &landmarks {
        Ok(set) => timed(&mut timings, Stage::Emotion, || {
            let scores = stages.emotion.recognize(frame, set, bbox)?;
            if !scores.is_valid() {
                return Err(StageError::internal(
                    "emotion scores must be finite and non-negative",
                ));
            }
            Ok(scores)
        }),
        Err(_) => Err(upstream()),
    };

    let authentication = timed(&mut timings, Stage::Authentication, || {
        check_template_set(job.models, Modality::Face)?;
        let out = stages.authenticator.authenticate(frame, bbox, job.models)?;
        out.verify_against(job.models)?;
        Ok(out)
    });

    let report = FaceReport {
        landmarks,
        headpose,
        gesture,
        emotion,
        authentication,
        timings,
    };
    log_failures(frame.index(), &report);
    report
}

pub(crate) fn timed<T>(
    timings: &mut Vec<(Stage, f64)>,
    stage: Stage,
    run: impl FnOnce() -> StageResult<T>,
) -> StageResult<T> {
    let start = Instant::now();
    let result = run();
    timings.push((stage, start.elapsed().as_secs_f64() * 1000.0));
    result
}

fn log_failures(frame_index: usize, report: &FaceReport) {
    let branches = [
        (Stage::Landmark, report.landmarks.as_ref().err()),
        (Stage::Headpose, report.headpose.as_ref().err()),
        (Stage::Gesture, report.gesture.as_ref().err()),
        (Stage::Emotion, report.emotion.as_ref().err()),
        (Stage::Authentication, report.authentication.as_ref().err()),
    ];
    for (stage, err) in branches {
        match err {
            Some(StageError::Upstream { .. }) => {
                log::debug!("Frame {frame_index}: {stage} skipped")
            }
            Some(e) => log::warn!("Frame {frame_index}: {stage} failed: {e}"),
            None => {}
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_stages::*;
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::shared::error::InputError;
    use crate::shared::frame::ImageFormat;

    fn frame() -> Frame {
        Frame::filled(0, 128, 64, ImageFormat::Rgb, 0)
    }

    fn models() -> Vec<BiometricModel> {
        vec![
            BiometricModel::new("alice", Modality::Face, vec![0u8; 4]),
            BiometricModel::new("bob", Modality::Face, vec![0u8; 4]),
        ]
    }

    fn job<'a>(frame: &'a Frame, stages: &'a FaceStages, models: &'a [BiometricModel]) -> FaceJob<'a> {
        FaceJob {
            frame,
            stages,
            models,
            headpose_mode: HeadposeMode::FromLandmarks,
        }
    }

    #[test]
    fn test_all_branches_succeed() {
        let (frame, models) = (frame(), models());
        let stages = stages(Vec::new(), Duration::ZERO);
        let report = analyze_face(&job(&frame, &stages, &models), &boxes_at(&[20.0])[0]);

        assert_eq!(report.landmarks.unwrap().len(), 1);
        assert_eq!(report.headpose.unwrap().yaw, 20.0);
        assert!(report.gesture.is_ok());
        assert_eq!(report.emotion.unwrap().happiness, 20.0);
        let auth = report.authentication.unwrap();
        assert_eq!(auth.len(), 2);
        assert_eq!(auth.scores[1].id, "bob");
        assert_eq!(report.timings.len(), 5);
    }

    #[test]
    fn test_landmark_failure_marks_dependents_upstream() {
        let (frame, models) = (frame(), models());
        let stages = stages(Vec::new(), Duration::ZERO);
        let report = analyze_face(&job(&frame, &stages, &models), &boxes_at(&[FAILING_X])[0]);

        let upstream = StageError::Upstream {
            stage: Stage::Landmark,
        };
        assert!(matches!(report.landmarks, Err(StageError::Internal(_))));
        assert_eq!(report.headpose.unwrap_err(), upstream);
        assert_eq!(report.gesture.unwrap_err(), upstream);
        assert_eq!(report.emotion.unwrap_err(), upstream);
        assert!(report.authentication.is_ok());
    }

    #[test]
    fn test_empty_landmark_set_reaches_dependents() {
        let (frame, models) = (frame(), models());
        let mut stages = stages(Vec::new(), Duration::ZERO);
        stages.landmarks = Arc::new(EmptyLandmarks);
        let report = analyze_face(&job(&frame, &stages, &models), &boxes_at(&[20.0])[0]);

        assert!(report.landmarks.unwrap().is_empty());
        assert_eq!(report.headpose.unwrap().yaw, 0.0);
        assert!(report.gesture.is_ok());
        assert!(report.emotion.is_ok());
    }

    #[test]
    fn test_headpose_from_localization_survives_landmark_failure() {
        let (frame, models) = (frame(), models());
        let stages = stages(Vec::new(), Duration::ZERO);
        let mut job = job(&frame, &stages, &models);
        job.headpose_mode = HeadposeMode::FromLocalization;

        let report = analyze_face(&job, &boxes_at(&[FAILING_X])[0]);
        assert_eq!(report.headpose.unwrap().yaw, -FAILING_X);
    }

    #[test]
    fn test_out_of_bounds_box_is_input_error() {
        let (frame, models) = (frame(), models());
        let stages = stages(Vec::new(), Duration::ZERO);
        let report = analyze_face(&job(&frame, &stages, &models), &BoundingBox::new(120.0, 60.0, 30.0, 30.0));
        assert!(matches!(
            report.landmarks,
            Err(StageError::Input(InputError::BoxOutOfBounds { .. }))
        ));
    }

    #[test]
    fn test_invalid_emotion_scores_are_internal() {
        let (frame, models) = (frame(), models());
        let mut stages = stages(Vec::new(), Duration::ZERO);
        stages.emotion = Arc::new(NegativeEmotion);
        let report = analyze_face(&job(&frame, &stages, &models), &boxes_at(&[20.0])[0]);
        assert!(matches!(report.emotion, Err(StageError::Internal(_))));
    }

    #[test]
    fn test_short_authentication_output_is_internal() {
        let (frame, models) = (frame(), models());
        let mut stages = stages(Vec::new(), Duration::ZERO);
        stages.authenticator = Arc::new(ShortAuthenticator);
        let report = analyze_face(&job(&frame, &stages, &models), &boxes_at(&[20.0])[0]);
        assert!(matches!(report.authentication, Err(StageError::Internal(_))));
    }

    #[test]
    fn test_duplicate_template_ids_fail_authentication_only() {
        let frame = frame();
        let models = vec![
            BiometricModel::new("alice", Modality::Face, vec![0u8; 4]),
            BiometricModel::new("alice", Modality::Face, vec![1u8; 4]),
        ];
        let stages = stages(Vec::new(), Duration::ZERO);
        let report = analyze_face(&job(&frame, &stages, &models), &boxes_at(&[20.0])[0]);
        assert_eq!(
            report.authentication.unwrap_err(),
            StageError::Input(InputError::DuplicateIdentity("alice".into()))
        );
        assert!(report.emotion.is_ok());
    }

    #[test]
    fn test_no_models_gives_empty_scores() {
        let frame = frame();
        let stages = stages(Vec::new(), Duration::ZERO);
        let report = analyze_face(&job(&frame, &stages, &[]), &boxes_at(&[20.0])[0]);
        assert!(report.authentication.unwrap().is_empty());
    }

    #[test]
    fn test_sequential_executor_keeps_box_order() {
        let (frame, models) = (frame(), models());
        let boxes = boxes_at(&[30.0, 10.0, 50.0]);
        let stages = stages(Vec::new(), Duration::ZERO);
        let reports = SequentialFaceBranchExecutor.execute(&job(&frame, &stages, &models), &boxes);

        let yaws: Vec<f32> = reports.iter().map(|r| r.headpose.as_ref().unwrap().yaw).collect();
        assert_eq!(yaws, vec![30.0, 10.0, 50.0]);
    }
}
