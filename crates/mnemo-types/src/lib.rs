//! `mnemo-types` – shared vocabulary for the Mnemo workspace.
//!
//! Holds the [`Record`] persisted by `mnemo-memory`, the question
//! normalization rule every component agrees on, the session [`Language`],
//! and the umbrella [`MnemoError`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Record
// ─────────────────────────────────────────────────────────────────────────────

/// A stored question/answer pair.
///
/// `derived_features` is the space-joined bag of lemmatized content words
/// extracted from `question`; it is only used as a pre-filter for
/// similarity search and may be absent on records written by older stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub question: String,
    pub answer: String,
    #[serde(
        default,
        rename = "processed_info",
        skip_serializing_if = "Option::is_none"
    )]
    pub derived_features: Option<String>,
}

impl Record {
    /// Build a record, normalizing `question` on the way in.
    pub fn new(question: &str, answer: impl Into<String>) -> Self {
        Self {
            question: normalize_question(question),
            answer: answer.into(),
            derived_features: None,
        }
    }

    /// Attach a feature bag to this record.
    pub fn with_features(mut self, features: impl Into<String>) -> Self {
        let features = features.into();
        self.derived_features = if features.is_empty() { None } else { Some(features) };
        self
    }
}

/// Normalize a raw question for storage and comparison.
///
/// Trims surrounding whitespace, upper-cases the first character, strips any
/// trailing question marks and appends exactly one. An empty input becomes
/// `"?"`.
pub fn normalize_question(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('?').trim_end();
    let mut chars = trimmed.chars();
    let mut out = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    out.push('?');
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Language
// ─────────────────────────────────────────────────────────────────────────────

/// Session language. Selects the speech voice and the encyclopedia edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Russian,
}

impl Language {
    /// ISO 639-1 code, e.g. `"en"`.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Russian => "ru",
        }
    }

    /// Map a menu choice (`"1"` / `"2"`) to a language.
    ///
    /// Returns `None` for anything else; callers default to English and tell
    /// the user.
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Language::English),
            "2" => Some(Language::Russian),
            _ => None,
        }
    }

    /// Parse a language name or code, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Some(Language::English),
            "russian" | "ru" => Some(Language::Russian),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "english"),
            Language::Russian => write!(f, "russian"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Umbrella error surfaced to the REPL.
///
/// Collaborator failures (answer sources, speech) are normally logged and
/// swallowed where they happen; only the variants that escape a turn end up
/// here.
#[derive(Error, Debug)]
pub enum MnemoError {
    #[error("Memory store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_capitalizes_and_appends_question_mark() {
        assert_eq!(
            normalize_question("  what is the capital of france "),
            "What is the capital of france?"
        );
    }

    #[test]
    fn normalize_collapses_trailing_question_marks() {
        assert_eq!(normalize_question("who wrote hamlet???"), "Who wrote hamlet?");
        assert_eq!(normalize_question("Who wrote Hamlet ?"), "Who wrote Hamlet?");
    }

    #[test]
    fn normalize_empty_input_is_bare_question_mark() {
        assert_eq!(normalize_question(""), "?");
        assert_eq!(normalize_question("   ?  "), "?");
    }

    #[test]
    fn normalize_handles_cyrillic() {
        assert_eq!(normalize_question("кто написал гамлета"), "Кто написал гамлета?");
    }

    #[test]
    fn record_new_normalizes_question() {
        let r = Record::new("who wrote hamlet", "Shakespeare");
        assert_eq!(r.question, "Who wrote hamlet?");
        assert!(r.derived_features.is_none());
    }

    #[test]
    fn with_empty_features_stays_none() {
        let r = Record::new("hi", "hello").with_features("");
        assert!(r.derived_features.is_none());
    }

    #[test]
    fn record_serializes_features_as_processed_info() {
        let r = Record::new("what is rust", "A language").with_features("rust");
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"processed_info\":\"rust\""));

        let bare = Record::new("what is rust", "A language");
        let json = serde_json::to_string(&bare).unwrap();
        assert!(!json.contains("processed_info"));
    }

    #[test]
    fn record_deserializes_without_features() {
        let r: Record =
            serde_json::from_str(r#"{"question":"Q?","answer":"A"}"#).unwrap();
        assert_eq!(r.answer, "A");
        assert!(r.derived_features.is_none());
    }

    #[test]
    fn language_choices() {
        assert_eq!(Language::from_choice("1"), Some(Language::English));
        assert_eq!(Language::from_choice(" 2 "), Some(Language::Russian));
        assert_eq!(Language::from_choice("3"), None);
        assert_eq!(Language::parse("RU"), Some(Language::Russian));
        assert_eq!(Language::Russian.code(), "ru");
        assert_eq!(Language::English.to_string(), "english");
    }

    #[test]
    fn mnemo_error_display() {
        let err = MnemoError::Store("disk full".into());
        assert!(err.to_string().contains("disk full"));
    }
}
