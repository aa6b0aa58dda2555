pub mod hand;
pub mod hand_tracker;
