use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::face::domain::headpose::HeadposeMode;
use crate::face::domain::localizer::LocalizationAlgorithm;
use crate::shared::constants::{
    DEFAULT_ENROLLMENT_MIN_SAMPLES, DEFAULT_ENROLLMENT_TARGET_SAMPLES,
    DEFAULT_EYE_CHANNEL_CAPACITY, DEFAULT_MATCH_IOU_THRESHOLD, DEFAULT_MAX_RECOVERY_TICKS,
    DEFAULT_VOICE_ENROLLMENT_SAMPLES,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceAnalysisConfig {
    pub localization_algorithm: LocalizationAlgorithm,
    pub headpose_mode: HeadposeMode,
    /// Worker threads for per-face branches. 0 = available parallelism.
    pub max_workers: usize,
}

impl Default for FaceAnalysisConfig {
    fn default() -> Self {
        Self {
            localization_algorithm: LocalizationAlgorithm::Nv,
            headpose_mode: HeadposeMode::FromLandmarks,
            max_workers: 0,
        }
    }
}

impl FaceAnalysisConfig {
    pub fn worker_count(&self) -> usize {
        if self.max_workers > 0 {
            self.max_workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceEnrollmentConfig {
    pub localization_algorithm: LocalizationAlgorithm,
    /// Accepted frames required by an early `finish()`.
    pub min_samples: usize,
    /// Accepted frames after which the session finalizes on its own.
    pub target_samples: usize,
    pub match_iou_threshold: f32,
}

impl Default for FaceEnrollmentConfig {
    fn default() -> Self {
        Self {
            localization_algorithm: LocalizationAlgorithm::Nv,
            min_samples: DEFAULT_ENROLLMENT_MIN_SAMPLES,
            target_samples: DEFAULT_ENROLLMENT_TARGET_SAMPLES,
            match_iou_threshold: DEFAULT_MATCH_IOU_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceEnrollmentConfig {
    pub target_samples: usize,
}

impl Default for VoiceEnrollmentConfig {
    fn default() -> Self {
        Self {
            target_samples: DEFAULT_VOICE_ENROLLMENT_SAMPLES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeTrackingConfig {
    pub channel_capacity: usize,
    pub max_recovery_ticks: usize,
    /// Pause between ticks; 0 lets the tracker set the pace.
    pub tick_interval_ms: u64,
}

impl Default for EyeTrackingConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_EYE_CHANNEL_CAPACITY,
            max_recovery_ticks: DEFAULT_MAX_RECOVERY_TICKS,
            tick_interval_ms: 0,
        }
    }
}

/// Tunables for every pipeline, loadable from JSON. Missing keys take defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensingConfig {
    pub face: FaceAnalysisConfig,
    pub face_enrollment: FaceEnrollmentConfig,
    pub voice_enrollment: VoiceEnrollmentConfig,
    pub eye_tracking: EyeTrackingConfig,
}

impl SensingConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.face_enrollment.validate()?;
        self.voice_enrollment.validate()?;
        self.eye_tracking.validate()
    }
}

impl FaceEnrollmentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_samples == 0 {
            return Err(ConfigError::Invalid(
                "face_enrollment.min_samples must be at least 1".into(),
            ));
        }
        if self.target_samples < self.min_samples {
            return Err(ConfigError::Invalid(format!(
                "face_enrollment.target_samples ({}) is below min_samples ({})",
                self.target_samples, self.min_samples
            )));
        }
        if !(0.0..=1.0).contains(&self.match_iou_threshold) {
            return Err(ConfigError::Invalid(format!(
                "face_enrollment.match_iou_threshold must be between 0.0 and 1.0, got {}",
                self.match_iou_threshold
            )));
        }
        Ok(())
    }
}

impl VoiceEnrollmentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_samples == 0 {
            return Err(ConfigError::Invalid(
                "voice_enrollment.target_samples must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl EyeTrackingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "eye_tracking.channel_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
