use crate::face::domain::authenticator::FaceAuthenticator;
use crate::face::domain::template_encoder::{FaceEmbeddingExtractor, FaceTemplateEncoder};
use crate::shared::biometric::{AuthenticationOutput, BiometricModel, Modality};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::StageError;
use crate::shared::frame::Frame;
use crate::shared::template_matcher::{build_template, score_templates};

/// Face authentication and enrollment encoding over any embedding extractor.
///
/// Scores are cosine similarities in [-1, 1]. Templates are the mean of
/// the enrollment embeddings.
pub struct CosineFaceMatcher<E> {
    extractor: E,
}

impl<E: FaceEmbeddingExtractor> CosineFaceMatcher<E> {
    pub fn new(extractor: E) -> Self {
        Self { extractor }
    }
}

impl<E: FaceEmbeddingExtractor> FaceAuthenticator for CosineFaceMatcher<E> {
    fn authenticate(
        &self,
        frame: &Frame,
        bbox: &BoundingBox,
        models: &[BiometricModel],
    ) -> Result<AuthenticationOutput, StageError> {
        if models.is_empty() {
            return Ok(AuthenticationOutput::default());
        }
        let query = self.extractor.extract(frame, bbox)?;
        score_templates(&query, models, Modality::Face)
    }
}

impl<E: FaceEmbeddingExtractor> FaceTemplateEncoder for CosineFaceMatcher<E> {
    fn sample(&self, frame: &Frame, bbox: &BoundingBox) -> Result<Vec<f32>, StageError> {
        self.extractor.extract(frame, bbox)
    }

    fn build(&self, identity: &str, samples: &[Vec<f32>]) -> Result<BiometricModel, StageError> {
        build_template(identity, Modality::Face, samples)
    }
}
