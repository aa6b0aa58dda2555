use serde::{Deserialize, Serialize};

use crate::shared::constants::{FINGER_COUNT, HAND_COUNT};
use crate::shared::error::InputError;
use crate::shared::point::Point3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandTrackingStatus {
    #[default]
    Inactive,
    /// First frame the hand is seen.
    Detected,
    Tracked,
    /// Reserved. Trackers must not report it.
    Extrapolated,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandOpenStatus {
    #[default]
    Unknown,
    Closed,
    Open,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerTrackingStatus {
    #[default]
    Inactive,
    Detected,
    Tracked,
    /// Reserved. Trackers must not report it.
    Extrapolated,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandSide {
    #[default]
    Unknown,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Finger {
    pub tracking_status: FingerTrackingStatus,
    pub tip: Point3,
}

/// One hand slot. `Hand::default()` is an inactive hand with five
/// inactive fingers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hand {
    pub tracking_status: HandTrackingStatus,
    pub open_status: HandOpenStatus,
    pub side: HandSide,
    pub position: Point3,
    pub tip: Point3,
    /// Classifier label, opaque to the pipeline.
    pub gesture: String,
    pub moving_gesture_event: String,
    pub fingers: [Finger; FINGER_COUNT],
}

impl Hand {
    pub fn is_active(&self) -> bool {
        self.tracking_status != HandTrackingStatus::Inactive
    }

    pub fn active_fingers(&self) -> usize {
        self.fingers
            .iter()
            .filter(|f| f.tracking_status != FingerTrackingStatus::Inactive)
            .count()
    }

    fn uses_reserved_status(&self) -> bool {
        self.tracking_status == HandTrackingStatus::Extrapolated
            || self
                .fingers
                .iter()
                .any(|f| f.tracking_status == FingerTrackingStatus::Extrapolated)
    }
}

/// Both hand slots for one frame. Absent hands stay in their slot as
/// inactive; slots are never omitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HandGestureOutput {
    pub hands: [Hand; HAND_COUNT],
}

impl HandGestureOutput {
    /// Places `hands` into the leading slots and leaves the rest inactive.
    pub fn from_hands(hands: Vec<Hand>) -> Result<Self, InputError> {
        if hands.len() > HAND_COUNT {
            return Err(InputError::TooManyHands(hands.len()));
        }
        let mut out = Self::default();
        for (slot, hand) in out.hands.iter_mut().zip(hands) {
            *slot = hand;
        }
        Ok(out)
    }

    pub fn active_hands(&self) -> impl Iterator<Item = &Hand> {
        self.hands.iter().filter(|h| h.is_active())
    }

    pub fn hand(&self, side: HandSide) -> Option<&Hand> {
        self.active_hands().find(|h| h.side == side)
    }

    pub(crate) fn uses_reserved_status(&self) -> bool {
        self.hands.iter().any(Hand::uses_reserved_status)
    }
}
