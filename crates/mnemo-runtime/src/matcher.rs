//! Matchers – decide whether a stored answer can be reused.
//!
//! Every matcher receives the normalized input question and the in-memory
//! copy of the store and returns at most one [`Match`]. Four strategies are
//! available, in increasing sophistication:
//!
//! | strategy    | comparison                                     | cutoff |
//! |-------------|------------------------------------------------|--------|
//! | `exact`     | identical normalized question                  | 1.0    |
//! | `fuzzy`     | case-folded sequence ratio, single best        | 0.8    |
//! | `threshold` | case-folded sequence ratio, every hit collected| 0.8    |
//! | `semantic`  | feature pre-filter + bag-of-words cosine       | 0.85   |
//!
//! An empty store, or a question with no text once normalized (`"?"`),
//! never matches.

use mnemo_types::Record;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::features::extract_features;
use crate::similarity::{bag_cosine, sequence_ratio};

/// Cutoff used by [`FuzzyMatcher`] and [`ThresholdMatcher`].
pub const DEFAULT_FUZZY_CUTOFF: f32 = 0.8;
/// Cutoff used by [`SemanticMatcher`].
pub const DEFAULT_SEMANTIC_THRESHOLD: f32 = 0.85;

// ─────────────────────────────────────────────────────────────────────────────
// Match / Matcher
// ─────────────────────────────────────────────────────────────────────────────

/// A stored record judged equivalent to the input question.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Position of the record in the store.
    pub index: usize,
    pub question: String,
    pub answer: String,
    /// Similarity score that qualified the record.
    pub score: f32,
}

impl Match {
    fn new(index: usize, record: &Record, score: f32) -> Self {
        Self {
            index,
            question: record.question.clone(),
            answer: record.answer.clone(),
            score,
        }
    }
}

/// Strategy for finding a reusable answer.
pub trait Matcher {
    /// Return the stored record equivalent to `question`, if any.
    fn find(&self, question: &str, records: &[Record]) -> Option<Match>;

    /// Which strategy this matcher implements.
    fn strategy(&self) -> MatchStrategy;
}

fn is_blank(question: &str) -> bool {
    question.trim().trim_end_matches('?').trim().is_empty()
}

// ─────────────────────────────────────────────────────────────────────────────
// Strategy selection
// ─────────────────────────────────────────────────────────────────────────────

/// Configurable matcher choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    Exact,
    Fuzzy,
    Threshold,
    #[default]
    Semantic,
}

impl MatchStrategy {
    /// Build the matcher for this strategy with its default cutoff.
    pub fn build(self) -> Box<dyn Matcher> {
        match self {
            MatchStrategy::Exact => Box::new(ExactMatcher),
            MatchStrategy::Fuzzy => Box::new(FuzzyMatcher::default()),
            MatchStrategy::Threshold => Box::new(ThresholdMatcher::default()),
            MatchStrategy::Semantic => Box::new(SemanticMatcher::default()),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Some(MatchStrategy::Exact),
            "fuzzy" => Some(MatchStrategy::Fuzzy),
            "threshold" => Some(MatchStrategy::Threshold),
            "semantic" => Some(MatchStrategy::Semantic),
            _ => None,
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::Exact => write!(f, "exact"),
            MatchStrategy::Fuzzy => write!(f, "fuzzy"),
            MatchStrategy::Threshold => write!(f, "threshold"),
            MatchStrategy::Semantic => write!(f, "semantic"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ExactMatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Reuses an answer only when the normalized question is identical.
pub struct ExactMatcher;

impl Matcher for ExactMatcher {
    fn find(&self, question: &str, records: &[Record]) -> Option<Match> {
        if is_blank(question) {
            return None;
        }
        records
            .iter()
            .position(|r| r.question == question)
            .map(|i| Match::new(i, &records[i], 1.0))
    }

    fn strategy(&self) -> MatchStrategy {
        MatchStrategy::Exact
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FuzzyMatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Single best case-folded sequence-ratio match at or above `cutoff`.
///
/// Ties keep the earliest stored record.
pub struct FuzzyMatcher {
    cutoff: f32,
}

impl FuzzyMatcher {
    pub fn new(cutoff: f32) -> Self {
        Self {
            cutoff: cutoff.clamp(0.0, 1.0),
        }
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_CUTOFF)
    }
}

impl Matcher for FuzzyMatcher {
    fn find(&self, question: &str, records: &[Record]) -> Option<Match> {
        if is_blank(question) {
            return None;
        }
        let needle = question.to_lowercase();
        let mut best: Option<(usize, f32)> = None;
        for (i, record) in records.iter().enumerate() {
            let score = sequence_ratio(&needle, &record.question.to_lowercase());
            if score >= self.cutoff && best.is_none_or(|(_, s)| score > s) {
                best = Some((i, score));
            }
        }
        let (i, score) = best?;
        debug!(score, question = %records[i].question, "fuzzy match");
        Some(Match::new(i, &records[i], score))
    }

    fn strategy(&self) -> MatchStrategy {
        MatchStrategy::Fuzzy
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ThresholdMatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Pairwise sequence ratio against every stored question, collecting all
/// records at or above `threshold` in store order.
pub struct ThresholdMatcher {
    threshold: f32,
}

impl ThresholdMatcher {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Every stored record at or above the threshold, in store order.
    pub fn find_all(&self, question: &str, records: &[Record]) -> Vec<Match> {
        if is_blank(question) {
            return Vec::new();
        }
        let needle = question.to_lowercase();
        records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| {
                let score = sequence_ratio(&needle, &r.question.to_lowercase());
                (score >= self.threshold).then(|| Match::new(i, r, score))
            })
            .collect()
    }
}

impl Default for ThresholdMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_CUTOFF)
    }
}

impl Matcher for ThresholdMatcher {
    fn find(&self, question: &str, records: &[Record]) -> Option<Match> {
        let hits = self.find_all(question, records);
        debug!(hits = hits.len(), "threshold matches");
        hits.into_iter().next()
    }

    fn strategy(&self) -> MatchStrategy {
        MatchStrategy::Threshold
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SemanticMatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Feature-filtered similarity search.
///
/// 1. Extract the input's feature bag. An input with no content words
///    ("Why not?") only matches a stored question equal to it ignoring case.
/// 2. Keep stored records whose feature string contains any input feature
///    as a substring. Records without a stored feature string are compared
///    on features extracted from their question.
/// 3. Score each candidate by bag-of-words cosine.
/// 4. Keep scores ≥ `threshold`, stable-sort descending, take the first.
pub struct SemanticMatcher {
    threshold: f32,
}

impl SemanticMatcher {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// All qualifying candidates, best first.
    pub fn ranked(&self, question: &str, records: &[Record]) -> Vec<Match> {
        if is_blank(question) {
            return Vec::new();
        }
        let input = extract_features(question);
        if input.is_empty() {
            return same_question(question, records);
        }

        let mut scored: Vec<Match> = records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| {
                let stored = match &r.derived_features {
                    Some(f) => f.to_lowercase(),
                    None => extract_features(&r.question).join(" "),
                };
                if !input.iter().any(|f| stored.contains(f.as_str())) {
                    return None;
                }
                let score = bag_cosine(
                    input.iter().map(String::as_str),
                    stored.split_whitespace(),
                );
                (score >= self.threshold).then(|| Match::new(i, r, score))
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }
}

/// Records whose question equals `question` ignoring case, scored 1.0.
///
/// Used when the input has no content words to compare.
fn same_question(question: &str, records: &[Record]) -> Vec<Match> {
    let folded = question.trim().to_lowercase();
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.question.trim().to_lowercase() == folded)
        .map(|(i, r)| Match::new(i, r, 1.0))
        .collect()
}

impl Default for SemanticMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SEMANTIC_THRESHOLD)
    }
}

impl Matcher for SemanticMatcher {
    fn find(&self, question: &str, records: &[Record]) -> Option<Match> {
        let best = self.ranked(question, records).into_iter().next()?;
        debug!(score = best.score, question = %best.question, "semantic match");
        Some(best)
    }

    fn strategy(&self) -> MatchStrategy {
        MatchStrategy::Semantic
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_types::normalize_question;

    fn france() -> Vec<Record> {
        vec![Record::new("What is the capital of France?", "Paris")]
    }

    // ── exact ────────────────────────────────────────────────────────────────

    #[test]
    fn exact_matches_identical_normalized_question() {
        let q = normalize_question("what is the capital of France");
        let m = ExactMatcher.find(&q, &france()).unwrap();
        assert_eq!(m.answer, "Paris");
        assert_eq!(m.score, 1.0);
    }

    #[test]
    fn exact_is_case_sensitive_beyond_first_letter() {
        let q = normalize_question("what is the capital of france");
        assert!(ExactMatcher.find(&q, &france()).is_none());
    }

    // ── fuzzy ────────────────────────────────────────────────────────────────

    #[test]
    fn fuzzy_case_folded_match_returns_paris() {
        let q = normalize_question("what is the capital of france");
        let m = FuzzyMatcher::default().find(&q, &france()).unwrap();
        assert_eq!(m.answer, "Paris");
        assert!(m.score >= 0.8);
    }

    #[test]
    fn fuzzy_rejects_unrelated_question() {
        let q = normalize_question("who wrote hamlet");
        assert!(FuzzyMatcher::default().find(&q, &france()).is_none());
    }

    #[test]
    fn fuzzy_picks_best_candidate() {
        let records = vec![
            Record::new("What is the capital of Spain?", "Madrid"),
            Record::new("What is the capital of France?", "Paris"),
        ];
        let q = normalize_question("what is the capital of france");
        let m = FuzzyMatcher::default().find(&q, &records).unwrap();
        assert_eq!(m.index, 1);
    }

    #[test]
    fn fuzzy_tie_keeps_first_record() {
        let records = vec![
            Record::new("Who wrote Hamlet?", "Shakespeare"),
            Record::new("Who wrote Hamlet?", "William Shakespeare"),
        ];
        let m = FuzzyMatcher::default().find("Who wrote Hamlet?", &records).unwrap();
        assert_eq!(m.answer, "Shakespeare");
    }

    // ── threshold ────────────────────────────────────────────────────────────

    #[test]
    fn threshold_collects_every_hit() {
        let records = vec![
            Record::new("What is the capital of France?", "Paris"),
            Record::new("Who wrote Hamlet?", "Shakespeare"),
            Record::new("What is the capital of France?", "Paris, obviously"),
        ];
        let q = normalize_question("what is the capital of france");
        let hits = ThresholdMatcher::default().find_all(&q, &records);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].index, 0);
        assert_eq!(hits[1].index, 2);

        let first = ThresholdMatcher::default().find(&q, &records).unwrap();
        assert_eq!(first.answer, "Paris");
    }

    // ── semantic ─────────────────────────────────────────────────────────────

    #[test]
    fn semantic_reuses_answer_for_same_content_words() {
        let records = vec![
            Record::new("What is the capital of France?", "Paris").with_features("be France capital"),
        ];
        let q = normalize_question("france: what is its capital");
        let m = SemanticMatcher::default().find(&q, &records).unwrap();
        assert_eq!(m.answer, "Paris");
        assert!(m.score >= 0.85);
    }

    #[test]
    fn semantic_prefilter_excludes_disjoint_features() {
        let records = vec![Record::new("Who wrote Hamlet?", "Shakespeare").with_features("write hamlet")];
        let q = normalize_question("what is the capital of france");
        assert!(SemanticMatcher::default().find(&q, &records).is_none());
    }

    #[test]
    fn semantic_below_threshold_is_rejected() {
        let records = vec![
            Record::new("What is the capital of France?", "Paris").with_features("be capital france"),
        ];
        // {be, capital, spain} vs {be, capital, france}: 2/3
        let q = normalize_question("what is the capital of spain");
        assert!(SemanticMatcher::default().find(&q, &records).is_none());
    }

    #[test]
    fn semantic_ranks_best_first_and_keeps_ties_stable() {
        let records = vec![
            Record::new("a", "partial").with_features("be capital france old"),
            Record::new("b", "first exact").with_features("be capital france"),
            Record::new("c", "second exact").with_features("france capital be"),
        ];
        let q = normalize_question("what is the capital of france");
        let ranked = SemanticMatcher::default().ranked(&q, &records);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].answer, "first exact");
        assert_eq!(ranked[1].answer, "second exact");
        assert_eq!(ranked[2].answer, "partial");
    }

    #[test]
    fn semantic_falls_back_to_question_features() {
        let records = vec![Record::new("Who wrote Hamlet?", "Shakespeare")];
        let m = SemanticMatcher::default().find("Who writes Hamlet?", &records).unwrap();
        assert_eq!(m.answer, "Shakespeare");
    }

    #[test]
    fn semantic_without_content_words_matches_same_question() {
        let records = vec![
            Record::new("Who wrote Hamlet?", "Shakespeare"),
            Record::new("Why not?", "Because."),
        ];
        let m = SemanticMatcher::default().find("why not?", &records).unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.score, 1.0);

        assert!(SemanticMatcher::default().find("Who?", &records).is_none());
        let who = vec![Record::new("Who?", "Someone")];
        assert_eq!(SemanticMatcher::default().find("Who?", &who).unwrap().answer, "Someone");
    }

    // ── edge cases ───────────────────────────────────────────────────────────

    #[test]
    fn empty_store_never_matches() {
        for strategy in [
            MatchStrategy::Exact,
            MatchStrategy::Fuzzy,
            MatchStrategy::Threshold,
            MatchStrategy::Semantic,
        ] {
            assert!(strategy.build().find("What is the capital of France?", &[]).is_none());
        }
    }

    #[test]
    fn blank_question_never_matches() {
        let records = vec![Record {
            question: "?".into(),
            answer: "nothing".into(),
            derived_features: None,
        }];
        for strategy in [
            MatchStrategy::Exact,
            MatchStrategy::Fuzzy,
            MatchStrategy::Threshold,
            MatchStrategy::Semantic,
        ] {
            let m = strategy.build();
            assert_eq!(m.strategy(), strategy);
            assert!(m.find("?", &records).is_none());
        }
    }

    #[test]
    fn strategy_parse_and_display() {
        assert_eq!(MatchStrategy::parse("Semantic"), Some(MatchStrategy::Semantic));
        assert_eq!(MatchStrategy::parse("bogus"), None);
        assert_eq!(MatchStrategy::Threshold.to_string(), "threshold");
        assert_eq!(MatchStrategy::default(), MatchStrategy::Semantic);
    }
}
