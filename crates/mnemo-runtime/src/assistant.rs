//! The per-turn question/answer pipeline.
//!
//! [`Assistant`] owns the memory store, a loaded copy of its records, the
//! matcher and the fallback chain of answer sources. Each call to
//! [`Assistant::resolve`] runs one turn:
//!
//! 1. normalize the question (optionally spell-correcting it first),
//! 2. look for an equivalent stored record,
//! 3. on a miss ask the answer sources, then append the new record.
//!
//! Presentation is left to the caller.

use mnemo_memory::MemoryStore;
use mnemo_types::{MnemoError, Record, normalize_question};
use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::answer_source::FallbackChain;
use crate::features::feature_string;
use crate::matcher::Matcher;
use crate::spelling::SpellChecker;

/// Where a turn's answer came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    /// Reused from memory with the given similarity score.
    Memory { score: f32 },
    /// Produced by the named answer source and stored.
    Source(String),
    /// Nothing could answer the question.
    NoAnswer,
}

/// The outcome of one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// The normalized question that was looked up.
    pub question: String,
    pub answer: Option<String>,
    pub origin: Origin,
}

pub struct Assistant<S: MemoryStore> {
    store: S,
    matcher: Box<dyn Matcher>,
    sources: FallbackChain,
    spell: Option<SpellChecker>,
    records: Vec<Record>,
    session: Uuid,
}

impl<S: MemoryStore> Assistant<S> {
    /// Load every record from `store` and build an assistant over it.
    pub fn open(
        store: S,
        matcher: Box<dyn Matcher>,
        sources: FallbackChain,
    ) -> Result<Self, MnemoError> {
        let records = store.load()?;
        let session = Uuid::new_v4();
        info!(
            %session,
            store = %store.describe(),
            records = records.len(),
            strategy = %matcher.strategy(),
            sources = ?sources.names(),
            "memory loaded"
        );
        Ok(Self {
            store,
            matcher,
            sources,
            spell: None,
            records,
            session,
        })
    }

    /// Enable or disable spell correction of incoming questions.
    ///
    /// When enabled the checker is taught every stored question.
    pub fn with_spell_check(mut self, enabled: bool) -> Self {
        self.set_spell_check(enabled);
        self
    }

    pub fn set_spell_check(&mut self, enabled: bool) {
        self.spell = enabled.then(|| {
            let mut checker = SpellChecker::new();
            for record in &self.records {
                checker.learn(&record.question);
            }
            checker
        });
    }

    pub fn set_matcher(&mut self, matcher: Box<dyn Matcher>) {
        self.matcher = matcher;
    }

    /// Replace the answer sources, e.g. after a model or language switch.
    pub fn set_sources(&mut self, sources: FallbackChain) {
        self.sources = sources;
    }

    pub fn spell_check_enabled(&self) -> bool {
        self.spell.is_some()
    }

    /// Run one turn for the raw user input `raw`.
    ///
    /// # Errors
    ///
    /// Only store failures escape; answer-source failures have already been
    /// logged and treated as "no answer" by the [`FallbackChain`].
    pub fn resolve(&mut self, raw: &str) -> Result<Turn, MnemoError> {
        let span = info_span!("turn", session = %self.session);
        let _enter = span.enter();

        let corrected = match &self.spell {
            Some(checker) => checker.correct(raw),
            None => raw.to_string(),
        };
        let question = normalize_question(&corrected);
        debug!(%question, "normalized");

        if let Some(hit) = self.matcher.find(&question, &self.records) {
            info!(index = hit.index, score = hit.score, "answered from memory");
            return Ok(Turn {
                question,
                answer: Some(hit.answer),
                origin: Origin::Memory { score: hit.score },
            });
        }

        let Some(sourced) = self.sources.resolve(&question) else {
            info!("no answer found");
            return Ok(Turn {
                question,
                answer: None,
                origin: Origin::NoAnswer,
            });
        };

        let record =
            Record::new(&question, sourced.answer.clone()).with_features(feature_string(&question));
        self.store.append(&record)?;
        if let Some(checker) = &mut self.spell {
            checker.learn(&record.question);
        }
        self.records.push(record);
        info!(source = %sourced.source, records = self.records.len(), "answer stored");

        Ok(Turn {
            question,
            answer: Some(sourced.answer),
            origin: Origin::Source(sourced.source),
        })
    }

    /// The in-memory copy of the store, in store order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn describe_store(&self) -> String {
        self.store.describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer_source::{AnswerSource, SourceError};
    use crate::matcher::MatchStrategy;
    use mnemo_memory::SqliteStore;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counting {
        calls: Rc<Cell<usize>>,
        reply: Option<&'static str>,
    }

    impl AnswerSource for Counting {
        fn name(&self) -> &str {
            "stub"
        }

        fn answer(&self, _question: &str) -> Result<Option<String>, SourceError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.reply.map(str::to_string))
        }
    }

    fn assistant(
        records: &[Record],
        strategy: MatchStrategy,
        reply: Option<&'static str>,
    ) -> (Assistant<SqliteStore>, Rc<Cell<usize>>) {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save(records).unwrap();
        let calls = Rc::new(Cell::new(0));
        let chain = FallbackChain::new().with(Counting {
            calls: calls.clone(),
            reply,
        });
        (Assistant::open(store, strategy.build(), chain).unwrap(), calls)
    }

    #[test]
    fn hit_skips_sources_and_store() {
        let (mut a, calls) = assistant(
            &[Record::new("What is the capital of France?", "Paris")],
            MatchStrategy::Fuzzy,
            Some("unused"),
        );
        let turn = a.resolve("what is the capital of france").unwrap();
        assert_eq!(turn.answer.as_deref(), Some("Paris"));
        assert!(matches!(turn.origin, Origin::Memory { .. }));
        assert_eq!(calls.get(), 0);
        assert_eq!(a.records().len(), 1);
    }

    #[test]
    fn miss_stores_normalized_record_with_features() {
        let (mut a, calls) = assistant(&[], MatchStrategy::Semantic, Some("William Shakespeare"));
        let turn = a.resolve("  who wrote Hamlet").unwrap();
        assert_eq!(turn.question, "Who wrote Hamlet?");
        assert_eq!(turn.origin, Origin::Source("stub".into()));
        assert_eq!(calls.get(), 1);

        let stored = a.store.load().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].question, "Who wrote Hamlet?");
        assert_eq!(stored[0].answer, "William Shakespeare");
        assert_eq!(stored[0].derived_features.as_deref(), Some("write hamlet"));
    }

    #[test]
    fn no_answer_stores_nothing() {
        let (mut a, calls) = assistant(&[], MatchStrategy::Fuzzy, None);
        let turn = a.resolve("What is blorp?").unwrap();
        assert_eq!(turn.answer, None);
        assert_eq!(turn.origin, Origin::NoAnswer);
        assert_eq!(calls.get(), 1);
        assert!(a.records().is_empty());
    }

    #[test]
    fn second_ask_is_served_from_memory() {
        let (mut a, calls) = assistant(&[], MatchStrategy::Exact, Some("Shakespeare"));
        a.resolve("Who wrote Hamlet?").unwrap();
        let again = a.resolve("who wrote Hamlet").unwrap();
        assert_eq!(again.origin, Origin::Memory { score: 1.0 });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn spell_check_uses_stored_questions() {
        let (a, _) = assistant(
            &[Record::new("Who wrote Hamlet?", "Shakespeare")],
            MatchStrategy::Fuzzy,
            None,
        );
        let mut a = a.with_spell_check(true);
        assert!(a.spell_check_enabled());
        let turn = a.resolve("who wrote hamelt").unwrap();
        assert_eq!(turn.question, "Who wrote hamlet?");
        assert_eq!(turn.answer.as_deref(), Some("Shakespeare"));
    }

    #[test]
    fn spell_check_keeps_names_as_typed() {
        let (a, calls) = assistant(&[], MatchStrategy::Semantic, Some("A city in Switzerland."));
        let mut a = a.with_spell_check(true);
        let turn = a.resolve("Where is Bern?").unwrap();
        assert_eq!(turn.question, "Where is Bern?");
        assert_eq!(calls.get(), 1);
        assert_eq!(a.store.load().unwrap()[0].question, "Where is Bern?");
    }

    #[test]
    fn repeated_question_without_content_words_hits_memory() {
        let (mut a, calls) = assistant(&[], MatchStrategy::Semantic, Some("Because."));
        a.resolve("Why not?").unwrap();
        let again = a.resolve("Why not?").unwrap();
        assert_eq!(again.origin, Origin::Memory { score: 1.0 });
        assert_eq!(calls.get(), 1);
        assert_eq!(a.records().len(), 1);
    }
}
