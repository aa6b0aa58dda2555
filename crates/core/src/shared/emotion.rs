use serde::{Deserialize, Serialize};

/// Seven-way emotion scores shared by face emotion, voice tone and enrollment.
///
/// Scores are non-negative and are passed through exactly as the scorer
/// produced them; they are not required to sum to 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionScores {
    pub anger: f32,
    pub disgust: f32,
    pub fear: f32,
    pub happiness: f32,
    pub neutral: f32,
    pub sadness: f32,
    pub surprise: f32,
}

pub const EMOTION_LABELS: [&str; 7] = [
    "anger",
    "disgust",
    "fear",
    "happiness",
    "neutral",
    "sadness",
    "surprise",
];

impl EmotionScores {
    pub fn from_array(values: [f32; 7]) -> Self {
        let [anger, disgust, fear, happiness, neutral, sadness, surprise] = values;
        Self {
            anger,
            disgust,
            fear,
            happiness,
            neutral,
            sadness,
            surprise,
        }
    }

    pub fn to_array(&self) -> [f32; 7] {
        [
            self.anger,
            self.disgust,
            self.fear,
            self.happiness,
            self.neutral,
            self.sadness,
            self.surprise,
        ]
    }

    /// All scores finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite() && *v >= 0.0)
    }

    pub fn total(&self) -> f32 {
        self.to_array().iter().sum()
    }

    /// Scores rescaled to sum to 1. An all-zero vector is returned unchanged.
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if total <= 0.0 {
            return *self;
        }
        Self::from_array(self.to_array().map(|v| v / total))
    }

    /// Label and score of the strongest emotion. Ties resolve to the earlier label.
    pub fn dominant(&self) -> (&'static str, f32) {
        let values = self.to_array();
        let mut best = 0;
        for (i, v) in values.iter().enumerate() {
            if *v > values[best] {
                best = i;
            }
        }
        (EMOTION_LABELS[best], values[best])
    }

    /// Element-wise mean, `None` for an empty input.
    pub fn mean<'a>(scores: impl IntoIterator<Item = &'a EmotionScores>) -> Option<Self> {
        let mut sum = [0.0f32; 7];
        let mut count = 0usize;
        for s in scores {
            for (acc, v) in sum.iter_mut().zip(s.to_array()) {
                *acc += v;
            }
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(Self::from_array(sum.map(|v| v / count as f32)))
    }
}
