//! `mnemo-runtime` – the question/answer engine.
//!
//! Turns a raw question into an answer by way of memory lookup and fallback
//! answer sources, then renders it.
//!
//! - [`similarity`] – string ratio, cosine and edit-distance scores.
//! - [`features`] – content-word extraction and lemmatization.
//! - [`spelling`] – vocabulary-based spell correction.
//! - [`matcher`] – strategies deciding whether a stored answer is reusable.
//! - [`answer_source`] – the [`AnswerSource`] trait and [`FallbackChain`].
//! - [`encyclopedia`] – encyclopedia summary lookup.
//! - [`llm_driver`] – streaming completions from a local model server.
//! - [`presentation`] – word wrap, speech and the [`Presenter`].
//! - [`assistant`] – the per-turn pipeline tying it together.
//! - [`telemetry`] – tracing subscriber and OTLP export.

pub mod answer_source;
pub mod assistant;
pub mod encyclopedia;
pub mod features;
pub mod llm_driver;
pub mod matcher;
pub mod presentation;
pub mod similarity;
pub mod spelling;
pub mod telemetry;

pub use answer_source::{AnswerSource, FallbackChain, SourceError, SourceKind, Sourced};
pub use assistant::{Assistant, Origin, Turn};
pub use encyclopedia::EncyclopediaSource;
pub use llm_driver::LlmDriver;
pub use matcher::{
    ExactMatcher, FuzzyMatcher, Match, MatchStrategy, Matcher, SemanticMatcher, ThresholdMatcher,
};
pub use presentation::{
    CommandSpeaker, Presenter, SilentSpeaker, Speaker, SpeechError, wrap_text,
};
pub use spelling::SpellChecker;
pub use telemetry::{TracerProviderGuard, init_tracing};
