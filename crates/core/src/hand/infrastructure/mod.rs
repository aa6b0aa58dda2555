pub mod replay_hand_tracker;
