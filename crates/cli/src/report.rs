use serde_json::{json, Value};

use sensekit_core::enrollment::domain::enrollment::SubmitOutcome;
use sensekit_core::face::domain::face_analysis::FaceAnalysisOutput;
use sensekit_core::face::domain::gesture::{EyeState, MouthState};
use sensekit_core::shared::biometric::{AuthenticationOutput, BiometricModel};
use sensekit_core::shared::error::StageResult;
use sensekit_core::voice::domain::voice_analysis::VoiceAnalysisOutput;

/// A branch result as JSON: the value, or `{"error": ...}`.
fn branch<T>(result: &StageResult<T>, render: impl FnOnce(&T) -> Value) -> Value {
    match result {
        Ok(v) => render(v),
        Err(e) => json!({ "error": e.to_string() }),
    }
}

fn scores(auth: &AuthenticationOutput) -> Value {
    let scores: Vec<Value> = auth
        .scores
        .iter()
        .map(|s| json!({ "id": s.id, "score": s.score }))
        .collect();
    json!({
        "scores": scores,
        "best": auth.best().map(|s| s.id.clone()),
    })
}

pub fn face_analysis(frame: usize, output: &FaceAnalysisOutput) -> Value {
    let faces: Vec<Value> = output
        .faces()
        .map(|face| {
            json!({
                "bbox": face.bbox,
                "landmarks": branch(face.landmarks, |l| json!(l.len())),
                "headpose": branch(face.headpose, |h| json!({
                    "yaw": h.yaw,
                    "pitch": h.pitch,
                    "roll": h.roll,
                })),
                "gesture": branch(face.gesture, |g| json!({
                    "eyes": match g.eyes {
                        EyeState::Open => "open",
                        EyeState::Closed => "closed",
                    },
                    "mouth": match g.mouth {
                        MouthState::Open => "open",
                        MouthState::Closed => "closed",
                    },
                })),
                "emotion": branch(face.emotion, |e| json!(e)),
                "authentication": branch(face.authentication, scores),
            })
        })
        .collect();
    json!({
        "frame": frame,
        "detected_face_count": output.detected_face_count(),
        "faces": faces,
    })
}

pub fn voice_analysis(clip: usize, output: &VoiceAnalysisOutput) -> Value {
    json!({
        "clip": clip,
        "pitch": branch(&output.pitch, |p| json!({
            "windows": p.hertz.len(),
            "voiced_fraction": p.voiced_fraction(),
            "mean_hz": p.voiced_stats().map(|(mean, _)| mean),
        })),
        "tone": branch(&output.tone, |t| json!({
            "stress_level": t.stress_level,
            "emotions": t.emotions,
        })),
        "authentication": branch(&output.authentication, scores),
    })
}

/// One submission's outcome during an enrollment run.
pub fn submission<T, S: std::fmt::Display>(
    input: usize,
    outcome: &SubmitOutcome<T, S>,
) -> Value {
    match outcome {
        SubmitOutcome::Continue { accepted } => {
            json!({ "input": input, "outcome": "continue", "accepted": accepted })
        }
        SubmitOutcome::Success(_) => json!({ "input": input, "outcome": "success" }),
        SubmitOutcome::Failed(status) => {
            json!({ "input": input, "outcome": "failed", "status": status.to_string() })
        }
    }
}

pub fn enrolled(model: &BiometricModel, extra: Value) -> Value {
    json!({
        "enrolled": model.id(),
        "modality": model.modality(),
        "template_bytes": model.template().len(),
        "details": extra,
    })
}

/// A whole-call failure for input `index`, keyed by input kind ("frame", "clip").
pub fn failure(kind: &str, index: usize, error: &dyn std::error::Error) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(kind.to_string(), json!(index));
    map.insert("error".to_string(), json!(error.to_string()));
    Value::Object(map)
}
