use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use sensekit_core::eye::domain::eye_tracking::EyeSample;
use sensekit_core::eye::infrastructure::scripted_eye_tracker::ScriptedEyeTracker;
use sensekit_core::face::domain::landmarks::LandmarkSet;
use sensekit_core::face::infrastructure::replay_face_stages::{RecordedFace, RecordedFrame};
use sensekit_core::hand::domain::hand::Hand;
use sensekit_core::hand::infrastructure::replay_hand_tracker::RecordedHands;
use sensekit_core::shared::bounding_box::BoundingBox;
use sensekit_core::shared::emotion::EmotionScores;
use sensekit_core::shared::error::{InputError, ResourceError, StageError};
use sensekit_core::shared::frame::{Frame, ImageFormat};
use sensekit_core::shared::point::Point3;
use sensekit_core::voice::domain::audio_clip::AudioClip;

const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_SAMPLE_RATE: u32 = 16_000;
const DEFAULT_CLIP_SECONDS: f32 = 1.0;
const DEFAULT_AMPLITUDE: f32 = 0.5;
const BLANK_PIXEL: u8 = 128;

/// A provider failure as written in a scenario file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordedFailure {
    CameraBusy,
    CameraFail,
    TimedOut,
    Internal,
}

impl RecordedFailure {
    pub fn to_stage_error(self) -> StageError {
        match self {
            RecordedFailure::CameraBusy => ResourceError::CameraBusy.into(),
            RecordedFailure::CameraFail => ResourceError::CameraFail.into(),
            RecordedFailure::TimedOut => StageError::TimedOut,
            RecordedFailure::Internal => StageError::internal("recorded provider failure"),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FixtureFace {
    pub bbox: BoundingBox,
    #[serde(default)]
    pub landmarks: Vec<Point3>,
    #[serde(default)]
    pub emotion: Option<EmotionScores>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FixtureFrame {
    pub index: usize,
    /// Image file to use as pixels, relative to the scenario file.
    #[serde(default)]
    pub image: Option<PathBuf>,
    #[serde(default)]
    pub faces: Vec<FixtureFace>,
    #[serde(default)]
    pub localization_failure: Option<RecordedFailure>,
    #[serde(default)]
    pub hands: Vec<Hand>,
    #[serde(default)]
    pub hand_failure: Option<RecordedFailure>,
}

/// A synthesized sine clip.
#[derive(Clone, Debug, Deserialize)]
pub struct FixtureClip {
    pub index: usize,
    pub hertz: f32,
    #[serde(default = "default_clip_seconds")]
    pub seconds: f32,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureCalibration {
    Ok,
    Failed(RecordedFailure),
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureTick {
    Sample(EyeSample),
    Lost(RecordedFailure),
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct EyeScript {
    pub calibrations: Vec<FixtureCalibration>,
    pub ticks: Vec<FixtureTick>,
}

/// Recorded provider output for one replayed session.
///
/// Frames without an `image` are a uniform grey `width`x`height` canvas.
#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_format")]
    pub format: ImageFormat,
    #[serde(default)]
    pub frames: Vec<FixtureFrame>,
    #[serde(default)]
    pub clips: Vec<FixtureClip>,
    #[serde(default)]
    pub eyes: EyeScript,
    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_format() -> ImageFormat {
    ImageFormat::Rgb
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_clip_seconds() -> f32 {
    DEFAULT_CLIP_SECONDS
}

fn default_amplitude() -> f32 {
    DEFAULT_AMPLITUDE
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read scenario {}: {e}", path.display()))?;
        let mut scenario: Scenario = serde_json::from_str(&json)
            .map_err(|e| format!("Cannot parse scenario {}: {e}", path.display()))?;
        scenario.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        scenario.check_unique_indices()?;
        log::debug!(
            "Loaded scenario {}: {} frames, {} clips, {} eye ticks",
            path.display(),
            scenario.frames.len(),
            scenario.clips.len(),
            scenario.eyes.ticks.len()
        );
        Ok(scenario)
    }

    fn check_unique_indices(&self) -> Result<(), Box<dyn Error>> {
        let mut seen = HashSet::new();
        for f in &self.frames {
            if !seen.insert(f.index) {
                return Err(format!("Frame index {} appears more than once", f.index).into());
            }
        }
        Ok(())
    }

    /// Builds the pixel buffer for a fixture frame.
    pub fn frame(&self, fixture: &FixtureFrame) -> Result<Frame, Box<dyn Error>> {
        let Some(image) = &fixture.image else {
            return Ok(Frame::filled(
                BLANK_PIXEL,
                self.width,
                self.height,
                self.format,
                fixture.index,
            ));
        };
        let path = self.base_dir.join(image);
        let img = image::open(&path)
            .map_err(|e| format!("Cannot open image {}: {e}", path.display()))?;
        let frame = match self.format {
            ImageFormat::Rgb => {
                let rgb = img.to_rgb8();
                let (w, h) = rgb.dimensions();
                Frame::try_new(rgb.into_raw(), w, h, ImageFormat::Rgb, fixture.index)?
            }
            ImageFormat::Ir => {
                let luma = img.to_luma8();
                let (w, h) = luma.dimensions();
                Frame::try_new(luma.into_raw(), w, h, ImageFormat::Ir, fixture.index)?
            }
        };
        Ok(frame)
    }

    pub fn frames(&self) -> Result<Vec<Frame>, Box<dyn Error>> {
        self.frames.iter().map(|f| self.frame(f)).collect()
    }

    pub fn face_recordings(&self) -> Result<HashMap<usize, RecordedFrame>, InputError> {
        let mut out = HashMap::with_capacity(self.frames.len());
        for f in &self.frames {
            let recorded = match f.localization_failure {
                Some(failure) => RecordedFrame::Failure(failure.to_stage_error()),
                None => RecordedFrame::Faces(
                    f.faces
                        .iter()
                        .map(|face| {
                            Ok(RecordedFace {
                                bbox: face.bbox,
                                landmarks: LandmarkSet::new(&face.landmarks)?,
                                emotion: face.emotion,
                            })
                        })
                        .collect::<Result<_, InputError>>()?,
                ),
            };
            out.insert(f.index, recorded);
        }
        Ok(out)
    }

    pub fn hand_recordings(&self) -> HashMap<usize, RecordedHands> {
        self.frames
            .iter()
            .map(|f| {
                let recorded = match f.hand_failure {
                    Some(failure) => RecordedHands::Failure(failure.to_stage_error()),
                    None => RecordedHands::Hands(f.hands.clone()),
                };
                (f.index, recorded)
            })
            .collect()
    }

    /// The box an enrollment submits with each frame: the first recorded face.
    pub fn enrollment_box(&self, fixture: &FixtureFrame) -> BoundingBox {
        fixture.faces.first().map(|f| f.bbox).unwrap_or_default()
    }

    pub fn clips(&self) -> Vec<AudioClip> {
        self.clips
            .iter()
            .map(|c| AudioClip::tone(c.hertz, c.seconds, c.sample_rate, c.amplitude, c.index))
            .collect()
    }

    pub fn eye_tracker(&self) -> ScriptedEyeTracker {
        let ticks = self
            .eyes
            .ticks
            .iter()
            .map(|t| match t {
                FixtureTick::Sample(sample) => Ok(sample.clone()),
                FixtureTick::Lost(failure) => Err(failure.to_stage_error()),
            })
            .collect();
        let calibrations = self
            .eyes
            .calibrations
            .iter()
            .map(|c| match c {
                FixtureCalibration::Ok => Ok(()),
                FixtureCalibration::Failed(failure) => Err(failure.to_stage_error()),
            })
            .collect();
        ScriptedEyeTracker::new(ticks).with_calibrations(calibrations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use sensekit_core::hand::domain::hand::HandSide;

    fn write_scenario(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("scenario.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(json.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_minimal_scenario_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(dir.path(), r#"{ "frames": [ { "index": 0 } ] }"#);
        let scenario = Scenario::load(&path).unwrap();

        let frames = scenario.frames().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].width(), DEFAULT_WIDTH);
        assert_eq!(frames[0].height(), DEFAULT_HEIGHT);
        assert_eq!(frames[0].format(), ImageFormat::Rgb);
        assert!(scenario.clips.is_empty());
        assert!(scenario.eyes.ticks.is_empty());
    }

    #[test]
    fn test_duplicate_frame_index_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(
            dir.path(),
            r#"{ "frames": [ { "index": 3 }, { "index": 3 } ] }"#,
        );
        let err = Scenario::load(&path).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_image_is_loaded_relative_to_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbImage::from_pixel(32, 24, image::Rgb([10, 20, 30]));
        img.save(dir.path().join("face.png")).unwrap();
        let path = write_scenario(
            dir.path(),
            r#"{ "frames": [ { "index": 7, "image": "face.png" } ] }"#,
        );

        let scenario = Scenario::load(&path).unwrap();
        let frame = scenario.frame(&scenario.frames[0]).unwrap();
        assert_eq!((frame.width(), frame.height()), (32, 24));
        assert_eq!(frame.index(), 7);
        assert_eq!(&frame.data()[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_ir_scenario_loads_grayscale() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::GrayImage::from_pixel(8, 8, image::Luma([200]));
        img.save(dir.path().join("ir.png")).unwrap();
        let path = write_scenario(
            dir.path(),
            r#"{ "format": "ir", "frames": [ { "index": 0, "image": "ir.png" } ] }"#,
        );

        let scenario = Scenario::load(&path).unwrap();
        let frame = scenario.frame(&scenario.frames[0]).unwrap();
        assert_eq!(frame.channels(), 1);
        assert_eq!(frame.data().len(), 64);
    }

    #[test]
    fn test_face_and_hand_recordings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(
            dir.path(),
            r#"{
                "frames": [
                    {
                        "index": 0,
                        "faces": [ { "bbox": { "x": 10, "y": 10, "width": 50, "height": 50 },
                                     "landmarks": [ { "x": 1, "y": 2, "z": 0 } ] } ],
                        "hands": [ { "tracking_status": "tracked", "side": "left" } ]
                    },
                    { "index": 1, "localization_failure": "camera_busy", "hand_failure": "timed_out" }
                ]
            }"#,
        );
        let scenario = Scenario::load(&path).unwrap();

        let faces = scenario.face_recordings().unwrap();
        match &faces[&0] {
            RecordedFrame::Faces(f) => {
                assert_eq!(f.len(), 1);
                assert_eq!(f[0].landmarks.len(), 1);
            }
            other => panic!("expected faces, got {other:?}"),
        }
        assert!(matches!(
            &faces[&1],
            RecordedFrame::Failure(StageError::Resource(ResourceError::CameraBusy))
        ));

        let hands = scenario.hand_recordings();
        match &hands[&0] {
            RecordedHands::Hands(h) => assert_eq!(h[0].side, HandSide::Left),
            other => panic!("expected hands, got {other:?}"),
        }
        assert!(matches!(
            &hands[&1],
            RecordedHands::Failure(StageError::TimedOut)
        ));

        let frame = &scenario.frames[0];
        assert_eq!(scenario.enrollment_box(frame).width, 50.0);
    }

    #[test]
    fn test_clips_are_synthesized() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(
            dir.path(),
            r#"{ "clips": [ { "index": 2, "hertz": 220, "seconds": 0.5, "sample_rate": 8000 } ] }"#,
        );
        let scenario = Scenario::load(&path).unwrap();

        let clips = scenario.clips();
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].samples().len(), 4000);
        assert_eq!(clips[0].index(), 2);
    }

    #[test]
    fn test_eye_script_parses_ticks_and_calibrations() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scenario(
            dir.path(),
            r#"{ "eyes": {
                "calibrations": [ { "failed": "camera_fail" }, "ok" ],
                "ticks": [ { "sample": { "tracker": "center" } }, { "lost": "timed_out" } ]
            } }"#,
        );
        let scenario = Scenario::load(&path).unwrap();

        assert_eq!(scenario.eyes.calibrations.len(), 2);
        assert!(matches!(
            scenario.eyes.ticks[1],
            FixtureTick::Lost(RecordedFailure::TimedOut)
        ));
        assert_eq!(scenario.eye_tracker().remaining_ticks(), 2);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = Scenario::load(Path::new("/nonexistent/scenario.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scenario.json"));
    }
}
