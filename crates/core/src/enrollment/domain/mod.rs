pub mod enrollment;
pub mod face_enrollment;
pub mod voice_enrollment;
