mod fixture;
mod report;
mod templates;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use sensekit_core::enrollment::domain::enrollment::SubmitOutcome;
use sensekit_core::enrollment::domain::face_enrollment::FaceEnrollmentStages;
use sensekit_core::enrollment::face_enrollment_session::FaceEnrollmentSession;
use sensekit_core::enrollment::voice_enrollment_session::VoiceEnrollmentSession;
use sensekit_core::eye::domain::eye_tracking::TrackingState;
use sensekit_core::face::domain::face_analysis::FaceStages;
use sensekit_core::face::infrastructure::cosine_face_matcher::CosineFaceMatcher;
use sensekit_core::face::infrastructure::geometric_gesture_classifier::GeometricGestureClassifier;
use sensekit_core::face::infrastructure::geometric_headpose_estimator::GeometricHeadposeEstimator;
use sensekit_core::face::infrastructure::histogram_embedding_extractor::HistogramEmbeddingExtractor;
use sensekit_core::face::infrastructure::replay_face_stages::ReplayFaceStages;
use sensekit_core::hand::infrastructure::replay_hand_tracker::ReplayHandTracker;
use sensekit_core::pipeline::eye_tracking_stream::EyeTrackingStream;
use sensekit_core::pipeline::face_analysis_use_case::FaceAnalysisUseCase;
use sensekit_core::pipeline::hand_gesture_use_case::HandGestureUseCase;
use sensekit_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use sensekit_core::pipeline::voice_analysis_use_case::VoiceAnalysisUseCase;
use sensekit_core::shared::biometric::{BiometricModel, Modality};
use sensekit_core::shared::config::SensingConfig;
use sensekit_core::voice::domain::voice_analysis::VoiceStages;
use sensekit_core::voice::infrastructure::cosine_voice_matcher::CosineVoiceMatcher;
use sensekit_core::voice::infrastructure::fft_pitch_detector::FftPitchDetector;
use sensekit_core::voice::infrastructure::pitch_contour_tone_detector::PitchContourToneDetector;
use sensekit_core::voice::infrastructure::spectral_embedding_extractor::SpectralEmbeddingExtractor;

use fixture::Scenario;

/// Replays recorded sensing sessions through the face, voice, hand and eye pipelines.
#[derive(Parser)]
#[command(name = "sensekit")]
struct Cli {
    /// JSON pipeline configuration (missing keys take defaults).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run face analysis on every frame of a scenario.
    Analyze {
        scenario: PathBuf,
        /// Face templates to authenticate against.
        #[arg(long)]
        templates: Option<PathBuf>,
    },
    /// Enroll one identity from the frames of a scenario.
    EnrollFace {
        scenario: PathBuf,
        #[arg(long)]
        identity: String,
        /// Template file to add the enrolled model to.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run voice analysis on every clip of a scenario.
    Voice {
        scenario: PathBuf,
        /// Voice templates to authenticate against.
        #[arg(long)]
        templates: Option<PathBuf>,
    },
    /// Enroll one identity from the clips of a scenario.
    EnrollVoice {
        scenario: PathBuf,
        #[arg(long)]
        identity: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run hand tracking on every frame of a scenario.
    Hands { scenario: PathBuf },
    /// Stream the scripted eye tracker.
    Eyes {
        scenario: PathBuf,
        /// Stop after this many ticks.
        #[arg(long, default_value = "20")]
        ticks: usize,
        /// Give up waiting for a tick after this long.
        #[arg(long, default_value = "1000")]
        timeout_ms: u64,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SensingConfig::load(path)?,
        None => SensingConfig::default(),
    };

    let lines = match cli.command {
        Command::Analyze {
            scenario,
            templates,
        } => run_analyze(&config, &scenario, templates.as_deref())?,
        Command::EnrollFace {
            scenario,
            identity,
            output,
        } => run_enroll_face(&config, &scenario, &identity, output.as_deref())?,
        Command::Voice {
            scenario,
            templates,
        } => run_voice(&scenario, templates.as_deref())?,
        Command::EnrollVoice {
            scenario,
            identity,
            output,
        } => run_enroll_voice(&config, &scenario, &identity, output.as_deref())?,
        Command::Hands { scenario } => run_hands(&scenario)?,
        Command::Eyes {
            scenario,
            ticks,
            timeout_ms,
        } => run_eyes(&config, &scenario, ticks, Duration::from_millis(timeout_ms))?,
    };

    for line in lines {
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}

fn load_templates(
    path: Option<&Path>,
    modality: Modality,
) -> Result<Vec<BiometricModel>, Box<dyn Error>> {
    match path {
        Some(p) => templates::load(p, modality),
        None => Ok(Vec::new()),
    }
}

fn face_matcher() -> Arc<CosineFaceMatcher<HistogramEmbeddingExtractor>> {
    Arc::new(CosineFaceMatcher::new(HistogramEmbeddingExtractor::new()))
}

fn voice_matcher() -> Arc<CosineVoiceMatcher<SpectralEmbeddingExtractor>> {
    Arc::new(CosineVoiceMatcher::new(SpectralEmbeddingExtractor::new()))
}

fn replay_stages(scenario: &Scenario) -> Result<Arc<ReplayFaceStages>, Box<dyn Error>> {
    Ok(Arc::new(ReplayFaceStages::new(Arc::new(
        scenario.face_recordings()?,
    ))))
}

fn run_analyze(
    config: &SensingConfig,
    scenario_path: &Path,
    templates: Option<&Path>,
) -> Result<Vec<Value>, Box<dyn Error>> {
    let scenario = Scenario::load(scenario_path)?;
    let models = load_templates(templates, Modality::Face)?;
    let replay = replay_stages(&scenario)?;

    let stages = FaceStages {
        localizer: replay.clone(),
        landmarks: replay.clone(),
        headpose: Arc::new(GeometricHeadposeEstimator::new(replay.clone())),
        gesture: Arc::new(GeometricGestureClassifier::default()),
        emotion: replay,
        authenticator: face_matcher(),
    };
    let mut use_case = FaceAnalysisUseCase::from_config(stages, config.face.clone())
        .with_logger(Box::new(StdoutPipelineLogger::new()));

    let mut lines = Vec::with_capacity(scenario.frames.len());
    for fixture in &scenario.frames {
        let frame = scenario.frame(fixture)?;
        match use_case.execute(&frame, &models) {
            Ok(output) => lines.push(report::face_analysis(fixture.index, &output)),
            Err(e) => {
                log::warn!("Frame {}: {e}", fixture.index);
                lines.push(report::failure("frame", fixture.index, &e));
            }
        }
    }
    use_case.summary();
    Ok(lines)
}

fn run_enroll_face(
    config: &SensingConfig,
    scenario_path: &Path,
    identity: &str,
    output: Option<&Path>,
) -> Result<Vec<Value>, Box<dyn Error>> {
    let scenario = Scenario::load(scenario_path)?;
    let replay = replay_stages(&scenario)?;
    let stages = FaceEnrollmentStages {
        localizer: replay.clone(),
        landmarks: replay.clone(),
        emotion: replay,
        encoder: face_matcher(),
    };
    let mut session =
        FaceEnrollmentSession::new(identity, stages, config.face_enrollment.clone())?
            .with_logger(Box::new(StdoutPipelineLogger::new()));

    let mut lines = Vec::new();
    let mut outcome = None;
    for fixture in &scenario.frames {
        let frame = scenario.frame(fixture)?;
        let result = session.submit(&frame, scenario.enrollment_box(fixture))?;
        lines.push(report::submission(fixture.index, &result));
        if result.is_terminal() {
            outcome = Some(result);
            break;
        }
    }
    let outcome = match outcome {
        Some(o) => o,
        None => {
            let finished = session.finish()?;
            lines.push(json!({ "finish": report::submission(scenario.frames.len(), &finished) }));
            finished
        }
    };

    match outcome {
        SubmitOutcome::Success(enrolled) => {
            if let Some(path) = output {
                templates::save(path, &enrolled.model)?;
            }
            lines.push(report::enrolled(
                &enrolled.model,
                json!({ "emotions": enrolled.emotions }),
            ));
        }
        SubmitOutcome::Failed(status) => {
            log::warn!("Face enrollment for {identity:?} failed: {status}");
            lines.push(json!({
                "identity": identity,
                "status": status.to_string(),
                "retryable": status.is_retryable(),
            }));
        }
        SubmitOutcome::Continue { .. } => {}
    }
    Ok(lines)
}

fn run_voice(scenario_path: &Path, templates: Option<&Path>) -> Result<Vec<Value>, Box<dyn Error>> {
    let scenario = Scenario::load(scenario_path)?;
    let models = load_templates(templates, Modality::Voice)?;
    let stages = VoiceStages {
        pitch: Arc::new(FftPitchDetector::new()),
        tone: Arc::new(PitchContourToneDetector::new()),
        authenticator: voice_matcher(),
    };
    let mut use_case =
        VoiceAnalysisUseCase::new(stages).with_logger(Box::new(StdoutPipelineLogger::new()));

    let mut lines = Vec::with_capacity(scenario.clips.len());
    for clip in scenario.clips() {
        match use_case.execute(&clip, &models) {
            Ok(output) => lines.push(report::voice_analysis(clip.index(), &output)),
            Err(e) => {
                log::warn!("Clip {}: {e}", clip.index());
                lines.push(report::failure("clip", clip.index(), &e));
            }
        }
    }
    Ok(lines)
}

fn run_enroll_voice(
    config: &SensingConfig,
    scenario_path: &Path,
    identity: &str,
    output: Option<&Path>,
) -> Result<Vec<Value>, Box<dyn Error>> {
    let scenario = Scenario::load(scenario_path)?;
    let clips = scenario.clips();
    let result = VoiceEnrollmentSession::enroll_batch(
        identity,
        voice_matcher(),
        config.voice_enrollment.clone(),
        &clips,
    )?;

    let line = match result {
        Ok(model) => {
            if let Some(path) = output {
                templates::save(path, &model)?;
            }
            report::enrolled(&model, json!({ "clips": clips.len() }))
        }
        Err(status) => {
            log::warn!("Voice enrollment for {identity:?} failed: {status}");
            json!({ "identity": identity, "status": status.to_string() })
        }
    };
    Ok(vec![line])
}

fn run_hands(scenario_path: &Path) -> Result<Vec<Value>, Box<dyn Error>> {
    let scenario = Scenario::load(scenario_path)?;
    let tracker = Arc::new(ReplayHandTracker::new(Arc::new(scenario.hand_recordings())));
    let mut use_case =
        HandGestureUseCase::new(tracker).with_logger(Box::new(StdoutPipelineLogger::new()));

    let mut lines = Vec::with_capacity(scenario.frames.len());
    for fixture in &scenario.frames {
        let frame = scenario.frame(fixture)?;
        match use_case.execute(&frame) {
            Ok(output) => lines.push(json!({ "frame": fixture.index, "hands": output.hands })),
            Err(e) => {
                log::warn!("Frame {}: {e}", fixture.index);
                lines.push(report::failure("frame", fixture.index, &e));
            }
        }
    }
    Ok(lines)
}

fn run_eyes(
    config: &SensingConfig,
    scenario_path: &Path,
    max_ticks: usize,
    timeout: Duration,
) -> Result<Vec<Value>, Box<dyn Error>> {
    let scenario = Scenario::load(scenario_path)?;
    let mut stream = EyeTrackingStream::start(
        Box::new(scenario.eye_tracker()),
        &config.eye_tracking,
    );

    let mut lines = Vec::new();
    while lines.len() < max_ticks {
        let Some(output) = stream.next_timeout(timeout) else {
            log::warn!("No eye-tracking tick within {timeout:?}");
            break;
        };
        let stopped = output.state == TrackingState::Stopped;
        lines.push(serde_json::to_value(&output)?);
        if stopped {
            break;
        }
    }
    stream.stop();
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_scenario(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("scenario.json");
        fs::write(&path, json).unwrap();
        path
    }

    const TWO_FACES: &str = r#"{
        "width": 200, "height": 200,
        "frames": [
            { "index": 0, "faces": [
                { "bbox": { "x": 10, "y": 10, "width": 60, "height": 60 },
                  "emotion": { "anger": 0, "disgust": 0, "fear": 0, "happiness": 0.9,
                               "neutral": 0.1, "sadness": 0, "surprise": 0 } },
                { "bbox": { "x": 100, "y": 100, "width": 60, "height": 60 } }
            ] },
            { "index": 1, "localization_failure": "camera_fail" }
        ]
    }"#;

    #[test]
    fn test_analyze_keeps_one_slot_per_face() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(dir.path(), TWO_FACES);

        let lines = run_analyze(&SensingConfig::default(), &path, None).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["detected_face_count"], 2);
        let faces = lines[0]["faces"].as_array().unwrap();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0]["emotion"]["happiness"].as_f64().unwrap(), 0.9f32 as f64);
        assert!(faces[1]["emotion"]["error"].is_string());
        // No templates: authentication succeeds with zero scores.
        assert_eq!(faces[0]["authentication"]["scores"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_analyze_reports_localization_failure_per_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(dir.path(), TWO_FACES);

        let lines = run_analyze(&SensingConfig::default(), &path, None).unwrap();
        assert_eq!(lines[1]["frame"], 1);
        assert!(lines[1]["error"].as_str().unwrap().contains("camera failed"));
    }

    const ENROLLABLE: &str = r#"{
        "width": 120, "height": 120,
        "frames": [
            { "index": 0, "faces": [ { "bbox": { "x": 20, "y": 20, "width": 60, "height": 60 },
                                       "emotion": { "neutral": 1, "anger": 0, "disgust": 0, "fear": 0,
                                                    "happiness": 0, "sadness": 0, "surprise": 0 } } ] },
            { "index": 1, "faces": [ { "bbox": { "x": 22, "y": 20, "width": 60, "height": 60 },
                                       "emotion": { "neutral": 1, "anger": 0, "disgust": 0, "fear": 0,
                                                    "happiness": 0, "sadness": 0, "surprise": 0 } } ] },
            { "index": 2, "faces": [ { "bbox": { "x": 24, "y": 20, "width": 60, "height": 60 },
                                       "emotion": { "neutral": 1, "anger": 0, "disgust": 0, "fear": 0,
                                                    "happiness": 0, "sadness": 0, "surprise": 0 } } ] }
        ]
    }"#;

    #[test]
    fn test_enroll_face_writes_template_usable_by_analyze() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(dir.path(), ENROLLABLE);
        let store = dir.path().join("templates.json");

        let lines =
            run_enroll_face(&SensingConfig::default(), &path, "alice", Some(&store)).unwrap();
        assert_eq!(lines.last().unwrap()["enrolled"], "alice");

        let lines = run_analyze(&SensingConfig::default(), &path, Some(&store)).unwrap();
        let auth = &lines[0]["faces"][0]["authentication"];
        assert_eq!(auth["scores"][0]["id"], "alice");
        assert_eq!(auth["best"], "alice");
    }

    #[test]
    fn test_enroll_face_with_too_few_frames_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(
            dir.path(),
            r#"{ "frames": [ { "index": 0, "faces": [
                { "bbox": { "x": 20, "y": 20, "width": 60, "height": 60 },
                  "emotion": { "neutral": 1, "anger": 0, "disgust": 0, "fear": 0,
                               "happiness": 0, "sadness": 0, "surprise": 0 } } ] } ] }"#,
        );

        let lines = run_enroll_face(&SensingConfig::default(), &path, "bob", None).unwrap();
        let last = lines.last().unwrap();
        assert_eq!(last["status"], "not enough faces detected");
        assert_eq!(last["retryable"], true);
    }

    #[test]
    fn test_voice_and_voice_enrollment() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(
            dir.path(),
            r#"{ "clips": [
                { "index": 0, "hertz": 220 },
                { "index": 1, "hertz": 220 },
                { "index": 2, "hertz": 220 }
            ] }"#,
        );
        let store = dir.path().join("templates.json");

        let enrolled =
            run_enroll_voice(&SensingConfig::default(), &path, "dana", Some(&store)).unwrap();
        assert_eq!(enrolled[0]["enrolled"], "dana");
        assert_eq!(enrolled[0]["modality"], "voice");

        let lines = run_voice(&path, Some(&store)).unwrap();
        assert_eq!(lines.len(), 3);
        let mean = lines[0]["pitch"]["mean_hz"].as_f64().unwrap();
        assert!((mean - 220.0).abs() < 5.0, "mean pitch {mean}");
        assert!(lines[0]["tone"]["stress_level"].is_number());
        assert_eq!(lines[0]["authentication"]["best"], "dana");
    }

    #[test]
    fn test_hands_fill_both_slots() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(
            dir.path(),
            r#"{ "frames": [
                { "index": 0, "hands": [ { "tracking_status": "tracked", "side": "right" } ] },
                { "index": 1, "hands": [ { "tracking_status": "extrapolated" } ] },
                { "index": 2 }
            ] }"#,
        );

        let lines = run_hands(&path).unwrap();
        assert_eq!(lines[0]["hands"].as_array().unwrap().len(), 2);
        assert_eq!(lines[0]["hands"][0]["side"], "right");
        assert_eq!(lines[0]["hands"][1]["tracking_status"], "inactive");
        assert!(lines[1]["error"].is_string());
        assert_eq!(lines[2]["hands"][0]["tracking_status"], "inactive");
    }

    #[test]
    fn test_eyes_stop_after_exhausted_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(
            dir.path(),
            r#"{ "eyes": { "ticks": [ { "sample": { "tracker": "center" } } ] } }"#,
        );
        let config = SensingConfig {
            eye_tracking: sensekit_core::shared::config::EyeTrackingConfig {
                max_recovery_ticks: 2,
                ..Default::default()
            },
            ..Default::default()
        };

        let lines = run_eyes(&config, &path, 50, Duration::from_secs(5)).unwrap();
        let states: Vec<&str> = lines.iter().map(|l| l["state"].as_str().unwrap()).collect();
        assert_eq!(
            states,
            vec!["calibrating", "normal", "recovery", "recovery", "stopped"]
        );
        assert_eq!(lines[4]["sample"]["tracker"], "center");
    }

    #[test]
    fn test_cli_parses_global_config_flag() {
        let cli = Cli::try_parse_from([
            "sensekit",
            "eyes",
            "scenario.json",
            "--ticks",
            "3",
            "--config",
            "sensekit.json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("sensekit.json")));
        assert!(matches!(cli.command, Command::Eyes { ticks: 3, .. }));
    }
}
