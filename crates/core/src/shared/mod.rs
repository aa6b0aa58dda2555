pub mod biometric;
pub mod bounding_box;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod emotion;
pub mod error;
pub mod frame;
pub mod point;
pub mod template_matcher;
