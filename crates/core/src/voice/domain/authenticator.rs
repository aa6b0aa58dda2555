use crate::shared::biometric::{AuthenticationOutput, BiometricModel};
use crate::shared::error::StageError;
use crate::voice::domain::audio_clip::AudioClip;

/// Scores a clip against a caller-supplied voice template set.
///
/// Same contract as face authentication: one score per model, in order.
pub trait VoiceAuthenticator: Send + Sync {
    fn authenticate(
        &self,
        clip: &AudioClip,
        models: &[BiometricModel],
    ) -> Result<AuthenticationOutput, StageError>;
}
