//! Encyclopedia answer source.
//!
//! Derives an article title from the question and fetches the article's
//! lead-section summary with one unauthenticated GET. The answer is the
//! first paragraph of that summary. A missing page, an empty summary, or a
//! disambiguation page all mean "no answer".
//!
//! The default URL template targets the Wikipedia REST API:
//!
//! ```text
//! https://{lang}.wikipedia.org/api/rest_v1/page/summary/{title}
//! ```

use mnemo_types::Language;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::answer_source::{AnswerSource, SourceError};

pub const DEFAULT_URL_TEMPLATE: &str =
    "https://{lang}.wikipedia.org/api/rest_v1/page/summary/{title}";

/// Leading phrases that carry no topic, longest first.
const QUESTION_PREFIXES: &[&str] = &[
    "what do you know about",
    "what is meant by",
    "can you tell me about",
    "tell me about",
    "what is",
    "what are",
    "what was",
    "what were",
    "who is",
    "who are",
    "who was",
    "who were",
    "where is",
    "where are",
    "where was",
    "when was",
    "when is",
    "define",
    "что такое",
    "кто такой",
    "кто такая",
    "кто такие",
    "кто был",
    "кто была",
    "где находится",
];

const INTERROGATIVES: &[&str] = &["who", "what", "where", "when", "which", "кто", "что", "где", "когда"];

const ARTICLES: &[&str] = &["the", "a", "an"];

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    extract: String,
}

/// Encyclopedia-backed [`AnswerSource`].
pub struct EncyclopediaSource {
    url_template: String,
    language: Language,
    client: Client,
}

impl EncyclopediaSource {
    /// Build a source for `language` using `url_template`, which may contain
    /// `{lang}` and `{title}` placeholders.
    pub fn new(
        url_template: impl Into<String>,
        language: Language,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(concat!("mnemo/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            url_template: url_template.into(),
            language,
            client,
        })
    }

    /// Fill the URL template for `title`.
    pub fn url_for(&self, title: &str) -> String {
        self.url_template
            .replace("{lang}", self.language.code())
            .replace("{title}", &urlencoding::encode(title))
    }
}

impl AnswerSource for EncyclopediaSource {
    fn name(&self) -> &str {
        "encyclopedia"
    }

    fn answer(&self, question: &str) -> Result<Option<String>, SourceError> {
        let Some(title) = article_title(question) else {
            return Ok(None);
        };
        let url = self.url_for(&title);
        debug!(%url, "fetching encyclopedia summary");

        let response = self.client.get(&url).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(%title, "no such article");
            return Ok(None);
        }
        let summary: PageSummary = response.error_for_status()?.json()?;
        if summary.kind == "disambiguation" {
            debug!(%title, "disambiguation page, no single answer");
            return Ok(None);
        }
        Ok(first_paragraph(&summary.extract))
    }
}

/// Turn a question into an article title.
///
/// Strips trailing punctuation, a leading question phrase (or an
/// interrogative plus its verb, as in *"Who wrote Hamlet"*), and a leading
/// article. The rest is capitalized and joined with underscores.
///
/// ```rust
/// use mnemo_runtime::encyclopedia::article_title;
///
/// assert_eq!(article_title("What is the capital of France?").as_deref(), Some("Capital_of_France"));
/// assert_eq!(article_title("Who wrote Hamlet?").as_deref(), Some("Hamlet"));
/// ```
pub fn article_title(question: &str) -> Option<String> {
    let trimmed = question.trim().trim_end_matches(['?', '.', '!']).trim();
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    let lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();

    let mut start = QUESTION_PREFIXES
        .iter()
        .map(|p| p.split_whitespace().collect::<Vec<_>>())
        .find(|p| p.len() < lower.len() && p.iter().zip(&lower).all(|(a, b)| a == b))
        .map(|p| p.len())
        .unwrap_or(0);

    if start == 0 && words.len() >= 3 && INTERROGATIVES.contains(&lower[0].as_str()) {
        start = 2;
    }
    if start < lower.len() && ARTICLES.contains(&lower[start].as_str()) && start + 1 < lower.len() {
        start += 1;
    }

    let topic = words.get(start..)?;
    if topic.is_empty() {
        return None;
    }
    let joined = topic.join("_");
    let mut chars = joined.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

/// First non-empty paragraph of `text`, trimmed.
pub fn first_paragraph(text: &str) -> Option<String> {
    text.split('\n')
        .map(str::trim)
        .find(|p| !p.is_empty())
        .map(str::to_string)
}
