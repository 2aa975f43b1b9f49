//! Builds the runtime collaborators from a [`Config`].

use mnemo_memory::{MemoryStore, open_store};
use mnemo_runtime::{
    AnswerSource, Assistant, CommandSpeaker, EncyclopediaSource, FallbackChain, LlmDriver,
    SilentSpeaker, SourceError, SourceKind, Speaker,
};
use mnemo_types::MnemoError;
use std::time::Duration;
use tracing::warn;

use crate::config::Config;

pub type SessionAssistant = Assistant<Box<dyn MemoryStore>>;

/// Answer sources in configured order. A source that cannot be constructed
/// is logged and left out.
pub fn build_sources(cfg: &Config) -> FallbackChain {
    let timeout = Duration::from_secs(cfg.http_timeout_secs);
    let mut chain = FallbackChain::new();
    for kind in &cfg.sources {
        let built: Result<Box<dyn AnswerSource>, SourceError> = match kind {
            SourceKind::Encyclopedia => {
                EncyclopediaSource::new(&cfg.encyclopedia_url, cfg.language, timeout)
                    .map(|s| Box::new(s) as Box<dyn AnswerSource>)
            }
            SourceKind::Model => LlmDriver::new(&cfg.ollama_url, &cfg.active_model, timeout)
                .map(|s| Box::new(s) as Box<dyn AnswerSource>),
        };
        match built {
            Ok(source) => chain.push(source),
            Err(e) => warn!(source = %kind, error = %e, "answer source unavailable"),
        }
    }
    chain
}

pub fn build_speaker(cfg: &Config) -> Box<dyn Speaker> {
    if cfg.speech {
        Box::new(CommandSpeaker::new(
            cfg.tts_command.clone(),
            cfg.voices.clone(),
            cfg.english_voice,
            cfg.russian_voice,
        ))
    } else {
        Box::new(SilentSpeaker)
    }
}

/// Open the configured store and load it into an assistant.
pub fn build_assistant(cfg: &Config) -> Result<SessionAssistant, MnemoError> {
    let store = open_store(cfg.store_backend, &cfg.resolved_store_path());
    let assistant = Assistant::open(store, cfg.matcher.build(), build_sources(cfg))?;
    Ok(assistant.with_spell_check(cfg.spell_check))
}
