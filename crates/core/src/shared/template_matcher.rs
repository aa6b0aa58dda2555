//! Modality-independent cosine scoring and template building.

use crate::shared::biometric::{
    check_template_set, AuthenticationOutput, AuthenticationScore, BiometricModel, Modality,
};
use crate::shared::embedding::{cosine_similarity, decode_template, encode_template, l2_normalize, mean_embedding};
use crate::shared::error::StageError;

/// Scores a query embedding against every template, in template order.
pub fn score_templates(
    query: &[f32],
    models: &[BiometricModel],
    modality: Modality,
) -> Result<AuthenticationOutput, StageError> {
    check_template_set(models, modality)?;
    let mut query = query.to_vec();
    l2_normalize(&mut query);

    let scores = models
        .iter()
        .map(|m| {
            let template = decode_template(m.template())?;
            if template.len() != query.len() {
                return Err(StageError::internal(format!(
                    "template {:?} has {} dimensions, query has {}",
                    m.id(),
                    template.len(),
                    query.len()
                )));
            }
            Ok(AuthenticationScore {
                id: m.id().to_string(),
                score: cosine_similarity(&query, &template),
            })
        })
        .collect::<Result<Vec<_>, StageError>>()?;

    Ok(AuthenticationOutput::new(scores))
}

/// Averages enrollment samples into one normalized template.
pub fn build_template(
    identity: &str,
    modality: Modality,
    samples: &[Vec<f32>],
) -> Result<BiometricModel, StageError> {
    let mean = mean_embedding(samples)?;
    Ok(BiometricModel::new(identity, modality, encode_template(&mean)))
}
