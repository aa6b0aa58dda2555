use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoiceEnrollmentStatus {
    Success,
    InternalError,
}

impl fmt::Display for VoiceEnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceEnrollmentStatus::Success => f.write_str("success"),
            VoiceEnrollmentStatus::InternalError => f.write_str("internal error"),
        }
    }
}
