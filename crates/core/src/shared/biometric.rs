use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::shared::error::{InputError, StageError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Face,
    Voice,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Face => write!(f, "face"),
            Modality::Voice => write!(f, "voice"),
        }
    }
}

/// A named, opaque biometric template for one identity in one modality.
///
/// The template bytes are only meaningful to the provider that produced
/// them. Cloning shares the underlying buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct BiometricModel {
    id: String,
    modality: Modality,
    template: Arc<[u8]>,
}

impl BiometricModel {
    pub fn new(id: impl Into<String>, modality: Modality, template: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: id.into(),
            modality,
            template: template.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn template(&self) -> &[u8] {
        &self.template
    }
}

/// Checks that a caller-supplied template set has one modality and unique ids.
pub fn check_template_set(models: &[BiometricModel], modality: Modality) -> Result<(), InputError> {
    let mut seen = HashSet::with_capacity(models.len());
    for m in models {
        if m.modality != modality {
            return Err(InputError::ModalityMismatch {
                id: m.id.clone(),
                expected: modality,
                actual: m.modality,
            });
        }
        if !seen.insert(m.id.as_str()) {
            return Err(InputError::DuplicateIdentity(m.id.clone()));
        }
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq)]
pub struct AuthenticationScore {
    pub id: String,
    /// Higher is a stronger match. The scale belongs to the scorer.
    pub score: f32,
}

/// One score per supplied template, in the order the templates were supplied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthenticationOutput {
    pub scores: Vec<AuthenticationScore>,
}

impl AuthenticationOutput {
    pub fn new(scores: Vec<AuthenticationScore>) -> Self {
        Self { scores }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn best(&self) -> Option<&AuthenticationScore> {
        self.scores
            .iter()
            .fold(None, |best: Option<&AuthenticationScore>, s| match best {
                Some(b) if b.score >= s.score => Some(b),
                _ => Some(s),
            })
    }

    /// Verifies a provider's answer: same length and same id order as `models`.
    pub fn verify_against(&self, models: &[BiometricModel]) -> Result<(), StageError> {
        if self.scores.len() != models.len() {
            return Err(StageError::internal(format!(
                "authenticator returned {} scores for {} templates",
                self.scores.len(),
                models.len()
            )));
        }
        for (i, (score, model)) in self.scores.iter().zip(models).enumerate() {
            if score.id != model.id() {
                return Err(StageError::internal(format!(
                    "score {i} is for {:?}, expected {:?}",
                    score.id,
                    model.id()
                )));
            }
        }
        Ok(())
    }
}
