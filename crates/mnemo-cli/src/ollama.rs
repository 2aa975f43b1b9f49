//! Ollama auto-discovery helpers.
//!
//! Pings the configured Ollama instance and, if responsive, fetches the list
//! of locally downloaded models from the `/api/tags` endpoint.

use serde::Deserialize;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// A single model entry returned by Ollama's `/api/tags` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaModel {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

/// Ping the Ollama server and return the list of available models.
///
/// Returns `Err(reason)` when the server is offline or answers with
/// something other than a tag list.
pub fn fetch_models(base_url: &str) -> Result<Vec<OllamaModel>, String> {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    let client = reqwest::blocking::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
    let response = client
        .get(&url)
        .send()
        .map_err(|e| format!("Ollama unreachable at {}: {}", url, e))?;

    if !response.status().is_success() {
        return Err(format!("Ollama returned HTTP {}", response.status()));
    }

    parse_tags(&response.text().map_err(|e| format!("Failed to read Ollama response: {}", e))?)
}

fn parse_tags(body: &str) -> Result<Vec<OllamaModel>, String> {
    let tags: TagsResponse = serde_json::from_str(body)
        .map_err(|e| format!("Failed to parse Ollama response: {}", e))?;
    Ok(tags.models)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tag_list() {
        let body = r#"{"models":[{"name":"mistral:latest","size":1},{"name":"llama3"}]}"#;
        let models = parse_tags(body).unwrap();
        let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["mistral:latest", "llama3"]);
    }

    #[test]
    fn empty_object_means_no_models() {
        assert!(parse_tags("{}").unwrap().is_empty());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_tags("<html>").is_err());
    }

    #[test]
    fn unreachable_server_is_an_error() {
        // Port 9 (discard) is closed on test machines.
        assert!(fetch_models("http://127.0.0.1:9").is_err());
    }
}
