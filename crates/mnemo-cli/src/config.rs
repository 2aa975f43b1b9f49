//! Configuration Vault – reads/writes `~/.mnemo/config.toml`.

use mnemo_memory::StoreBackend;
use mnemo_runtime::encyclopedia::DEFAULT_URL_TEMPLATE;
use mnemo_runtime::presentation::DEFAULT_WRAP_WIDTH;
use mnemo_runtime::{MatchStrategy, SourceKind};
use mnemo_types::{Language, MnemoError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted user configuration stored in `~/.mnemo/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Session language: speech voice and encyclopedia edition.
    #[serde(default)]
    pub language: Language,

    #[serde(default)]
    pub store_backend: StoreBackend,

    /// Memory file location. Defaults to `~/.mnemo/memory.db` or
    /// `~/.mnemo/memory.json` depending on the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    #[serde(default)]
    pub matcher: MatchStrategy,

    /// Correct spelling before matching. Off unless asked for.
    #[serde(default)]
    pub spell_check: bool,

    /// Answer sources, tried in order on a memory miss.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceKind>,

    /// Base URL of the Ollama instance.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Model used for completions (e.g. "mistral").
    #[serde(default = "default_model")]
    pub active_model: String,

    /// Summary endpoint with `{lang}` and `{title}` placeholders.
    #[serde(default = "default_encyclopedia_url")]
    pub encyclopedia_url: String,

    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,

    #[serde(default = "default_true")]
    pub speech: bool,

    /// Text-to-speech program, invoked as `<tts_command> -v <voice> <text>`.
    #[serde(default = "default_tts_command")]
    pub tts_command: String,

    #[serde(default = "default_voices")]
    pub voices: Vec<String>,

    /// Index into `voices` used for English.
    #[serde(default = "default_english_voice")]
    pub english_voice: usize,

    /// Index into `voices` used for Russian.
    #[serde(default = "default_russian_voice")]
    pub russian_voice: usize,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_sources() -> Vec<SourceKind> {
    vec![SourceKind::Encyclopedia, SourceKind::Model]
}
fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "mistral".to_string()
}
fn default_encyclopedia_url() -> String {
    DEFAULT_URL_TEMPLATE.to_string()
}
fn default_wrap_width() -> usize {
    DEFAULT_WRAP_WIDTH
}
fn default_tts_command() -> String {
    "espeak-ng".to_string()
}
fn default_voices() -> Vec<String> {
    ["en", "en-us", "ru"].iter().map(|v| v.to_string()).collect()
}
fn default_english_voice() -> usize {
    1
}
fn default_russian_voice() -> usize {
    2
}
fn default_http_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: Language::default(),
            store_backend: StoreBackend::default(),
            store_path: None,
            matcher: MatchStrategy::default(),
            spell_check: false,
            sources: default_sources(),
            ollama_url: default_ollama_url(),
            active_model: default_model(),
            encyclopedia_url: default_encyclopedia_url(),
            wrap_width: default_wrap_width(),
            speech: default_true(),
            tts_command: default_tts_command(),
            voices: default_voices(),
            english_voice: default_english_voice(),
            russian_voice: default_russian_voice(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}

impl Config {
    /// The memory file to open: `store_path` if set, otherwise the
    /// backend's default file next to the config.
    pub fn resolved_store_path(&self) -> PathBuf {
        match &self.store_path {
            Some(p) => p.clone(),
            None => default_store_path(&home_dir(), self.store_backend),
        }
    }
}

fn home_dir() -> String {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string())
}

/// Return the path to `~/.mnemo/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(&home_dir())
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".mnemo").join("config.toml")
}

pub(crate) fn default_store_path(home: &str, backend: StoreBackend) -> PathBuf {
    let file = match backend {
        StoreBackend::Json => "memory.json",
        StoreBackend::Sqlite => "memory.db",
    };
    PathBuf::from(home).join(".mnemo").join(file)
}

/// Load the config from disk. Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, MnemoError> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, MnemoError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        MnemoError::Config(format!("Failed to read config at {}: {}", path.display(), e))
    })?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| MnemoError::Config(format!("Failed to parse config: {}", e)))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `MNEMO_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `MNEMO_OLLAMA_URL` | `ollama_url` |
/// | `MNEMO_MODEL` | `active_model` |
/// | `MNEMO_STORE_PATH` | `store_path` |
/// | `MNEMO_WRAP_WIDTH` | `wrap_width` |
/// | `MNEMO_LANGUAGE` | `language` |
///
/// Unparseable values are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("MNEMO_OLLAMA_URL") {
        cfg.ollama_url = v;
    }
    if let Ok(v) = std::env::var("MNEMO_MODEL") {
        cfg.active_model = v;
    }
    if let Ok(v) = std::env::var("MNEMO_STORE_PATH")
        && !v.trim().is_empty()
    {
        cfg.store_path = Some(PathBuf::from(v));
    }
    if let Ok(v) = std::env::var("MNEMO_WRAP_WIDTH")
        && let Ok(width) = v.parse::<usize>()
        && width > 0
    {
        cfg.wrap_width = width;
    }
    if let Ok(v) = std::env::var("MNEMO_LANGUAGE")
        && let Some(language) = Language::parse(&v)
    {
        cfg.language = language;
    }
}

/// Save the config to disk, creating `~/.mnemo/` if necessary.
pub fn save(cfg: &Config) -> Result<(), MnemoError> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), MnemoError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            MnemoError::Config(format!("Failed to create config directory: {}", e))
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(|e| {
                MnemoError::Config(format!("Failed to set config directory permissions: {}", e))
            })?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| MnemoError::Config(format!("Failed to serialize config: {}", e)))?;
    let write_err =
        |e: std::io::Error| MnemoError::Config(format!("Failed to write config at {}: {}", path.display(), e));
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;
    Ok(())
}
