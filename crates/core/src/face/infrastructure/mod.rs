pub mod cosine_face_matcher;
pub mod geometric_gesture_classifier;
pub mod geometric_headpose_estimator;
pub mod histogram_embedding_extractor;
pub mod replay_face_stages;
