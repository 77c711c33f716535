//! Emotion classification
//!
//! Maps free-text labels returned by the inference endpoint onto a closed set
//! of states, and talks to that endpoint.

mod client;

pub use client::{EmotionClient, InferenceError, InferenceOutcome, InferenceResult, ParseError};

use std::fmt;

/// Emotion states the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmotionState {
    /// Initial state, also used for unknown labels
    #[default]
    None,
    Happy,
    Sad,
    Angry,
}

/// Keywords in match priority order
const KEYWORDS: [(&str, EmotionState); 3] = [
    ("happy", EmotionState::Happy),
    ("sad", EmotionState::Sad),
    ("angry", EmotionState::Angry),
];

impl EmotionState {
    /// Case-insensitive keyword containment, first keyword in
    /// `happy`, `sad`, `angry` order wins.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        if normalized.is_empty() {
            return EmotionState::None;
        }

        KEYWORDS
            .iter()
            .find(|(keyword, _)| normalized.contains(keyword))
            .map(|(_, state)| *state)
            .unwrap_or(EmotionState::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionState::None => "None",
            EmotionState::Happy => "Happy",
            EmotionState::Sad => "Sad",
            EmotionState::Angry => "Angry",
        }
    }
}

impl fmt::Display for EmotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies an optional label, absent labels map to [`EmotionState::None`]
pub fn classify(label: Option<&str>) -> EmotionState {
    label.map(EmotionState::from_label).unwrap_or_default()
}
