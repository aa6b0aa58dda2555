use crate::shared::biometric::{AuthenticationOutput, BiometricModel};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::StageError;
use crate::shared::frame::Frame;

/// Scores one face against a caller-supplied template set.
///
/// Must return one score per model in the order given; an empty model
/// slice yields an empty output. Acceptance thresholds belong to the caller.
pub trait FaceAuthenticator: Send + Sync {
    fn authenticate(
        &self,
        frame: &Frame,
        bbox: &BoundingBox,
        models: &[BiometricModel],
    ) -> Result<AuthenticationOutput, StageError>;
}
