pub mod domain;
pub mod face_enrollment_session;
pub mod voice_enrollment_session;
