pub mod authenticator;
pub mod emotion_recognizer;
pub mod face_analysis;
pub mod gesture;
pub mod headpose;
pub mod landmarks;
pub mod localizer;
pub mod template_encoder;
