pub mod eye_tracker;
pub mod eye_tracking;
