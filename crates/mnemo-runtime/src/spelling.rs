//! Dictionary-based spell correction.
//!
//! The [`SpellChecker`] starts from bundled frequency-ordered English and
//! Russian word lists and is taught every stored question on top. A word
//! it already knows is never touched. An unknown word is replaced by the
//! closest known word only when that word is a single edit away (two for
//! long words); everything else is left as typed.

use std::collections::HashMap;
use tracing::debug;

use crate::similarity::edit_distance;

/// One word per line, most frequent first.
const ENGLISH_WORDS: &str = include_str!("../data/words_en.txt");
const RUSSIAN_WORDS: &str = include_str!("../data/words_ru.txt");

/// Words this long or shorter may only be corrected to a word of the same
/// length.
const SHORT_WORD: usize = 4;
/// Words longer than this may be two edits from their correction.
const LONG_WORD: usize = 7;

/// Spell checker over a frequency-weighted vocabulary.
#[derive(Debug, Clone)]
pub struct SpellChecker {
    counts: HashMap<String, usize>,
}

impl Default for SpellChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl SpellChecker {
    /// A checker that knows the bundled dictionaries.
    ///
    /// Dictionary words are weighted by rank so that earlier (more common)
    /// entries win ties.
    pub fn new() -> Self {
        let entries: Vec<&str> = ENGLISH_WORDS
            .lines()
            .chain(RUSSIAN_WORDS.lines())
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .collect();
        let total = entries.len();
        let mut counts = HashMap::with_capacity(total);
        for (rank, word) in entries.into_iter().enumerate() {
            counts.entry(word.to_lowercase()).or_insert(total - rank);
        }
        Self { counts }
    }

    /// Add every word in `text` to the vocabulary.
    pub fn learn(&mut self, text: &str) {
        for word in words(text) {
            *self.counts.entry(word.to_lowercase()).or_insert(0) += 1;
        }
    }

    /// Whether `word` is in the vocabulary (case-insensitive).
    pub fn knows(&self, word: &str) -> bool {
        self.counts.contains_key(&word.to_lowercase())
    }

    /// Correct a single word.
    ///
    /// Returned unchanged: known words, words shorter than three characters
    /// and words containing non-letters. Otherwise the closest known word
    /// wins (ties: more frequent, then alphabetical) if it is
    ///
    /// - one edit away and the same length, for words of up to 4 letters;
    /// - one edit away, for words of 5 to 7 letters;
    /// - at most two edits away, for longer words.
    ///
    /// An adjacent swap counts as one edit. A leading capital is preserved.
    pub fn correct_word(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        let len = lower.chars().count();
        if len < 3 || !lower.chars().all(char::is_alphabetic) || self.counts.contains_key(&lower) {
            return word.to_string();
        }
        let max_distance = if len > LONG_WORD { 2 } else { 1 };

        let best = self
            .counts
            .iter()
            .filter(|(known, _)| {
                let known_len = known.chars().count();
                if len <= SHORT_WORD {
                    known_len == len
                } else {
                    known_len.abs_diff(len) <= max_distance
                }
            })
            .map(|(known, &count)| (edit_distance(&lower, known), count, known))
            .filter(|(d, _, _)| *d <= max_distance)
            .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)).then(a.2.cmp(b.2)));

        match best {
            Some((distance, _, known)) => {
                debug!(from = %word, to = %known, distance, "spelling corrected");
                match_case(word, known)
            }
            None => word.to_string(),
        }
    }

    /// Correct every word in `text`, leaving punctuation and spacing intact.
    ///
    /// Names are left alone: a capitalized word anywhere but the start of
    /// the text, or a word with a capital after its first letter.
    pub fn correct(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut word = String::new();
        let mut first = true;
        for c in text.chars() {
            if c.is_alphanumeric() || c == '\'' {
                word.push(c);
            } else {
                if !word.is_empty() {
                    out.push_str(&self.correct_token(&word, first));
                    first = false;
                    word.clear();
                }
                out.push(c);
            }
        }
        if !word.is_empty() {
            out.push_str(&self.correct_token(&word, first));
        }
        out
    }

    fn correct_token(&self, word: &str, first: bool) -> String {
        if looks_like_name(word, first) {
            return word.to_string();
        }
        self.correct_word(word)
    }
}

fn looks_like_name(word: &str, first: bool) -> bool {
    let mut chars = word.chars();
    let starts_upper = chars.next().is_some_and(char::is_uppercase);
    (starts_upper && !first) || chars.any(char::is_uppercase)
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
}

fn match_case(original: &str, replacement: &str) -> String {
    let starts_upper = original.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper {
        return replacement.to_string();
    }
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
