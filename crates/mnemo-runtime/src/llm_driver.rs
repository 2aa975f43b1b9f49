//! [`LlmDriver`] – local generative-model answer source.
//!
//! Talks to a locally-running model server that exposes an OpenAI-compatible
//! `/v1/completions` endpoint, such as [Ollama](https://ollama.com)
//! (`http://localhost:11434`). The question is wrapped in a
//! `Question: … Answer:` prompt and the reply is streamed back as
//! server-sent events; text fragments are accumulated until the server
//! signals completion or a stop sequence appears.
//!
//! # Example
//!
//! ```rust,no_run
//! use mnemo_runtime::llm_driver::LlmDriver;
//! use mnemo_runtime::AnswerSource;
//! use std::time::Duration;
//!
//! let driver = LlmDriver::new("http://localhost:11434", "mistral", Duration::from_secs(60)).unwrap();
//!
//! // Requires a running Ollama instance.
//! let answer = driver.answer("Who wrote Hamlet?").unwrap();
//! ```

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::time::Duration;
use tracing::debug;

use crate::answer_source::{AnswerSource, SourceError};

/// Maximum tokens requested per completion.
pub const MAX_TOKENS: u32 = 100;

/// Sequences that end a completion.
pub const STOP_SEQUENCES: &[&str] = &["\n", "Question:", "Q:"];

/// Build the completion prompt for `question`.
pub fn prompt_for(question: &str) -> String {
    format!("Question: {} Answer:", question.trim())
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal request / response shapes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    stop: &'a [&'a str],
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    text: String,
    #[serde(default)]
    finish_reason: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// LlmDriver
// ─────────────────────────────────────────────────────────────────────────────

/// A blocking client for an OpenAI-compatible completions endpoint.
///
/// Construct once and reuse for the whole session.
pub struct LlmDriver {
    base_url: String,
    model: String,
    client: Client,
}

impl LlmDriver {
    /// Create a new driver pointing at `base_url` (e.g. `"http://localhost:11434"`)
    /// and using `model` (e.g. `"mistral"`).
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            model: model.into(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run `prompt` through the model and return the accumulated text.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the request fails,
    /// [`SourceError::Stream`] if the body cannot be read, or
    /// [`SourceError::BadResponse`] if a fragment is not valid JSON.
    pub fn complete(&self, prompt: &str) -> Result<String, SourceError> {
        let url = format!("{}/v1/completions", self.base_url.trim_end_matches('/'));
        let body = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens: MAX_TOKENS,
            stop: STOP_SEQUENCES,
            stream: true,
        };
        debug!(%url, model = %self.model, "requesting completion");

        let response = self.client.post(&url).json(&body).send()?.error_for_status()?;
        accumulate_stream(BufReader::new(response))
    }
}

impl AnswerSource for LlmDriver {
    fn name(&self) -> &str {
        "model"
    }

    fn answer(&self, question: &str) -> Result<Option<String>, SourceError> {
        let text = self.complete(&prompt_for(question))?;
        let text = text.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }
}

/// Concatenate the `text` fragments of a server-sent completion stream.
///
/// Reading stops at `data: [DONE]`, at the first fragment carrying a
/// `finish_reason`, or as soon as the accumulated text contains one of
/// [`STOP_SEQUENCES`], in which case it is cut just before the stop
/// sequence. Lines that are not `data:` events are ignored.
pub fn accumulate_stream<R: BufRead>(reader: R) -> Result<String, SourceError> {
    let mut output = String::new();
    for line in reader.lines() {
        let line = line?;
        let Some(payload) = line.trim().strip_prefix("data:") else {
            continue;
        };
        let payload = payload.trim();
        if payload == "[DONE]" {
            break;
        }
        if payload.is_empty() {
            continue;
        }
        let chunk: CompletionChunk = serde_json::from_str(payload)
            .map_err(|e| SourceError::BadResponse(format!("{e}: {payload}")))?;

        let mut finished = false;
        for choice in chunk.choices {
            output.push_str(&choice.text);
            finished |= choice.finish_reason.is_some();
        }
        if let Some(cut) = first_stop(&output) {
            output.truncate(cut);
            break;
        }
        if finished {
            break;
        }
    }
    Ok(output)
}

fn first_stop(text: &str) -> Option<usize> {
    STOP_SEQUENCES.iter().filter_map(|s| text.find(s)).min()
}
