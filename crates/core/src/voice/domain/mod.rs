pub mod audio_clip;
pub mod authenticator;
pub mod pitch;
pub mod template_encoder;
pub mod tone;
pub mod voice_analysis;
