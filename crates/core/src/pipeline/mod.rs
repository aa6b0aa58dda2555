pub mod eye_tracking_stream;
pub mod face_analysis_use_case;
pub mod face_branch_executor;
pub mod hand_gesture_use_case;
pub mod infrastructure;
pub mod pipeline_logger;
pub mod voice_analysis_use_case;
