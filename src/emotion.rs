use std::fmt;

/// Class labels in the index order the model was trained with.
///
/// The order is a contract of the supplied model artifact and cannot be
/// verified from here: reordering it mislabels every prediction silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "Angry",
            Emotion::Disgust => "Disgust",
            Emotion::Fear => "Fear",
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
            Emotion::Surprise => "Surprise",
            Emotion::Neutral => "Neutral",
        }
    }

    /// Resolves a raw score vector to a label. The vector must hold exactly one
    /// score per class. Ties go to the lowest index.
    pub fn from_scores(scores: &[f32]) -> Option<Self> {
        if scores.len() != Self::ALL.len() {
            return None;
        }
        argmax(scores).and_then(Self::from_index)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index of the largest score, first occurrence on ties. A NaN counts as the
/// maximum, so the first NaN wins.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .copied()
        .enumerate()
        .reduce(|accum, item| {
            if accum.1.is_nan() {
                accum
            } else if item.1.is_nan() || item.1 > accum.1 {
                item
            } else {
                accum
            }
        })
        .map(|(index, _)| index)
}
