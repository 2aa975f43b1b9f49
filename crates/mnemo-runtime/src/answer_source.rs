//! Answer sources – produce a fresh answer when memory has none.
//!
//! The core's only contract with a source is "given a question, return an
//! answer or nothing". [`FallbackChain`] tries its sources in order, logs
//! and swallows every failure, and stops at the first answer.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise while asking a source for an answer.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The response could not be interpreted.
    #[error("Unexpected response format: {0}")]
    BadResponse(String),
    /// Reading a streamed response failed mid-way.
    #[error("Stream read error: {0}")]
    Stream(#[from] std::io::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// AnswerSource
// ─────────────────────────────────────────────────────────────────────────────

/// A producer of answers for questions memory could not resolve.
pub trait AnswerSource {
    /// Short label used in logs and in the turn origin, e.g. `"wikipedia"`.
    fn name(&self) -> &str;

    /// Answer `question`, or `Ok(None)` when the source has nothing to say.
    fn answer(&self, question: &str) -> Result<Option<String>, SourceError>;
}

/// Configurable source kinds, listed in fallback order in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Encyclopedia,
    Model,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Encyclopedia => write!(f, "encyclopedia"),
            SourceKind::Model => write!(f, "model"),
        }
    }
}

impl SourceKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "encyclopedia" | "wikipedia" | "wiki" => Some(SourceKind::Encyclopedia),
            "model" | "llm" | "ollama" => Some(SourceKind::Model),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FallbackChain
// ─────────────────────────────────────────────────────────────────────────────

/// An answer together with the name of the source that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sourced {
    pub source: String,
    pub answer: String,
}

/// Ordered list of sources; the first to answer wins.
#[derive(Default)]
pub struct FallbackChain {
    sources: Vec<Box<dyn AnswerSource>>,
}

impl FallbackChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source to the end of the chain.
    pub fn with(mut self, source: impl AnswerSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn push(&mut self, source: Box<dyn AnswerSource>) {
        self.sources.push(source);
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Ask each source in turn.
    ///
    /// Errors are logged and treated like "no answer". Blank answers count
    /// as no answer.
    pub fn resolve(&self, question: &str) -> Option<Sourced> {
        for source in &self.sources {
            match source.answer(question) {
                Ok(Some(answer)) if !answer.trim().is_empty() => {
                    debug!(source = source.name(), "answer produced");
                    return Some(Sourced {
                        source: source.name().to_string(),
                        answer: answer.trim().to_string(),
                    });
                }
                Ok(_) => debug!(source = source.name(), "no answer"),
                Err(e) => warn!(source = source.name(), error = %e, "answer source failed"),
            }
        }
        None
    }
}
