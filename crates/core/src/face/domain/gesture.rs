use crate::face::domain::landmarks::LandmarkSet;
use crate::shared::error::StageError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouthState {
    Closed,
    Open,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EyeState {
    Closed,
    Open,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FacialGesture {
    pub eyes: EyeState,
    pub mouth: MouthState,
}

/// Classifies mouth and eye state from landmarks alone.
///
/// Too few landmarks is an input error, never a third category.
pub trait GestureClassifier: Send + Sync {
    fn classify(&self, landmarks: &LandmarkSet) -> Result<FacialGesture, StageError>;
}
