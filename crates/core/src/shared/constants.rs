/// Capacity of a landmark set. Index `i` names the same anatomical point
/// in every set produced by a given landmark provider.
pub const MAX_LANDMARK_COUNT: usize = 170;

/// Hand slots in every hand-gesture output.
pub const HAND_COUNT: usize = 2;

/// Finger slots per hand.
pub const FINGER_COUNT: usize = 5;

/// Number of points in the iBUG 68-point layout used by the geometric stages.
pub const IBUG_LANDMARK_COUNT: usize = 68;

/// IoU a localized face must reach against the caller's box during enrollment.
pub const DEFAULT_MATCH_IOU_THRESHOLD: f32 = 0.5;

pub const DEFAULT_ENROLLMENT_MIN_SAMPLES: usize = 3;
pub const DEFAULT_ENROLLMENT_TARGET_SAMPLES: usize = 5;
pub const DEFAULT_VOICE_ENROLLMENT_SAMPLES: usize = 3;

/// Bounded queue between the eye-tracking producer and its consumer.
pub const DEFAULT_EYE_CHANNEL_CAPACITY: usize = 8;

/// Consecutive failed ticks before the eye tracker gives up (~1 second at 30 Hz).
pub const DEFAULT_MAX_RECOVERY_TICKS: usize = 30;
