use std::sync::Arc;

use crate::shared::biometric::AuthenticationOutput;
use crate::shared::error::StageResult;
use crate::voice::domain::authenticator::VoiceAuthenticator;
use crate::voice::domain::pitch::{PitchDetector, VoicePitchOutput};
use crate::voice::domain::tone::{ToneDetector, VoiceTone};

#[derive(Clone)]
pub struct VoiceStages {
    pub pitch: Arc<dyn PitchDetector>,
    pub tone: Arc<dyn ToneDetector>,
    pub authenticator: Arc<dyn VoiceAuthenticator>,
}

/// Result of one voice-analysis call. Tone depends on pitch; authentication
/// is independent of both.
#[derive(Clone, Debug)]
pub struct VoiceAnalysisOutput {
    pub pitch: StageResult<VoicePitchOutput>,
    pub tone: StageResult<VoiceTone>,
    pub authentication: StageResult<AuthenticationOutput>,
}
