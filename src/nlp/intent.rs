//! Keyword-based intent detection.
//!
//! The keyword table is ordered data: the first intent with a matching
//! phrase wins, so declaration order is the tie-break.

use std::fmt;

use serde::Serialize;

/// Coarse category of an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Greeting,
    Goodbye,
    Booking,
    Information,
    Question,
    Unknown,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::Goodbye => "goodbye",
            Intent::Booking => "booking",
            Intent::Information => "information",
            Intent::Question => "question",
            Intent::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority-ordered keyword phrases. Matching is a plain substring test on
/// the lower-cased input, so `"hi"` also fires inside `"this"`.
pub const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (Intent::Greeting, &["hello", "hi", "hey"]),
    (Intent::Goodbye, &["bye", "goodbye", "see you"]),
    (Intent::Booking, &["book", "schedule", "reserve"]),
    (Intent::Information, &["tell me about", "give me info", "what is"]),
    (Intent::Question, &["who", "what", "where", "when", "why", "how"]),
];

/// Return the first intent whose keyword set matches `text`, or
/// [`Intent::Unknown`].
pub fn detect_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();
    INTENT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Unknown)
}
