//! Feature-bag extraction.
//!
//! Reduces a question to its content words: verbs, adjectives, nouns and
//! numbers, each lemmatized. Function words (determiners, pronouns,
//! prepositions, conjunctions, interrogatives, modal auxiliaries) are
//! dropped. Forms of *to be* survive as the lemma `be`.
//!
//! The lemmatizer is a small irregular-form table followed by suffix rules.
//! It only needs to be consistent: both stored questions and incoming ones
//! go through the same function.
//!
//! ```rust
//! use mnemo_runtime::features::feature_string;
//!
//! assert_eq!(feature_string("What is the capital of France?"), "be capital france");
//! assert_eq!(feature_string("Who wrote Hamlet?"), "write hamlet");
//! ```

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "some", "any", "of", "in", "on", "at",
    "to", "for", "from", "by", "with", "about", "into", "onto", "over", "under", "and", "or",
    "but", "nor", "if", "then", "than", "so", "as", "what", "who", "whom", "whose", "which",
    "where", "when", "why", "how", "do", "does", "did", "can", "could", "would", "should", "will",
    "shall", "may", "might", "must", "i", "you", "he", "she", "it", "we", "they", "me", "him",
    "her", "us", "them", "my", "your", "his", "its", "our", "their", "there", "here", "please",
    "s", "t", "not", "no", "yes", "very", "just", "also",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("am", "be"),
    ("is", "be"),
    ("are", "be"),
    ("was", "be"),
    ("were", "be"),
    ("been", "be"),
    ("being", "be"),
    ("has", "have"),
    ("had", "have"),
    ("having", "have"),
    ("wrote", "write"),
    ("written", "write"),
    ("writing", "write"),
    ("made", "make"),
    ("built", "build"),
    ("began", "begin"),
    ("begun", "begin"),
    ("found", "find"),
    ("founded", "found"),
    ("ran", "run"),
    ("went", "go"),
    ("gone", "go"),
    ("came", "come"),
    ("gave", "give"),
    ("given", "give"),
    ("took", "take"),
    ("taken", "take"),
    ("saw", "see"),
    ("seen", "see"),
    ("knew", "know"),
    ("known", "know"),
    ("said", "say"),
    ("thought", "think"),
    ("died", "die"),
    ("lived", "live"),
    ("people", "person"),
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("mice", "mouse"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("better", "good"),
    ("best", "good"),
    ("worse", "bad"),
    ("worst", "bad"),
];

/// Extract the lemmatized content words of `text`, first occurrence first,
/// without duplicates.
pub fn extract_features(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let lower = token.to_lowercase();
        if STOP_WORDS.contains(&lower.as_str()) {
            continue;
        }
        let lemma = lemmatize(&lower);
        if !out.contains(&lemma) {
            out.push(lemma);
        }
    }
    out
}

/// [`extract_features`] joined with single spaces, the form persisted in
/// the store's feature column.
pub fn feature_string(text: &str) -> String {
    extract_features(text).join(" ")
}

/// Lemmatize a single lower-case word.
pub fn lemmatize(word: &str) -> String {
    if let Some((_, lemma)) = IRREGULAR.iter().find(|(form, _)| *form == word) {
        return (*lemma).to_string();
    }
    if !word.chars().all(|c| c.is_ascii_alphabetic()) || word.len() <= 3 {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies")
        && stem.len() > 1
    {
        return format!("{stem}y");
    }
    if word.ends_with("sses") {
        return word[..word.len() - 2].to_string();
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix('s') {
        return stem.to_string();
    }
    if let Some(stem) = word.strip_suffix("ing")
        && stem.len() >= 3
    {
        return undouble(stem);
    }
    if let Some(stem) = word.strip_suffix("ed")
        && stem.len() >= 3
    {
        return undouble(stem);
    }
    word.to_string()
}

/// `"runn"` → `"run"`, `"stopp"` → `"stop"`; leaves `ll`, `ss`, `zz` alone.
fn undouble(stem: &str) -> String {
    let bytes = stem.as_bytes();
    let n = bytes.len();
    if n >= 2 && bytes[n - 1] == bytes[n - 2] && !matches!(bytes[n - 1], b'l' | b's' | b'z') {
        return stem[..n - 1].to_string();
    }
    stem.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capital_question_features() {
        assert_eq!(
            extract_features("What is the capital of France?"),
            vec!["be", "capital", "france"]
        );
    }

    #[test]
    fn drops_stop_words_only() {
        assert_eq!(feature_string("Where do they live?"), "live");
    }

    #[test]
    fn keeps_numbers() {
        assert_eq!(feature_string("What happened in 1066?"), "happen 1066");
    }

    #[test]
    fn deduplicates_preserving_order() {
        assert_eq!(feature_string("cats and cats and dogs"), "cat dog");
    }

    #[test]
    fn only_stop_words_yields_empty() {
        assert!(extract_features("what is it?").first().is_some_and(|f| f == "be"));
        assert!(extract_features("who are you").iter().all(|f| f == "be"));
        assert!(extract_features("?").is_empty());
    }

    #[test]
    fn lemmatizer_rules() {
        assert_eq!(lemmatize("cities"), "city");
        assert_eq!(lemmatize("classes"), "class");
        assert_eq!(lemmatize("glass"), "glass");
        assert_eq!(lemmatize("paris"), "paris");
        assert_eq!(lemmatize("capitals"), "capital");
        assert_eq!(lemmatize("running"), "run");
        assert_eq!(lemmatize("stopped"), "stop");
        assert_eq!(lemmatize("invented"), "invent");
        assert_eq!(lemmatize("wrote"), "write");
        assert_eq!(lemmatize("were"), "be");
        assert_eq!(lemmatize("bus"), "bus");
    }

    #[test]
    fn non_ascii_words_pass_through() {
        assert_eq!(feature_string("Столица Франции"), "столица франции");
    }
}
