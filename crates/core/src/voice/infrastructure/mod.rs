pub mod cosine_voice_matcher;
pub mod fft_pitch_detector;
pub mod pitch_contour_tone_detector;
pub mod spectral_embedding_extractor;
