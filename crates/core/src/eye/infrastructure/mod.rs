pub mod scripted_eye_tracker;
