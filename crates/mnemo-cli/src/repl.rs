//! REPL – Read-Eval-Print Loop for the Mnemo interactive shell.
//!
//! Free text is a question. `quit` (any case) exits. Supported slash-commands:
//!   /help            – show this list
//!   /settings        – interactively edit `~/.mnemo/config.toml`
//!   /models          – list / switch the local model
//!   /memory          – list stored questions
//!   /language [lang] – switch between English and Russian
//!   /quit | /exit    – gracefully exit the CLI

use colored::Colorize;
use mnemo_runtime::{MatchStrategy, Origin, Presenter};
use mnemo_types::Language;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

use crate::config::{self, Config};
use crate::ollama;
use crate::wiring::{self, SessionAssistant};

/// What the loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// One interactive session: the assistant, its presenter, and the config
/// it was built from.
pub struct Repl<W: Write> {
    assistant: SessionAssistant,
    presenter: Presenter<W>,
    cfg: Config,
    config_path: PathBuf,
}

impl<W: Write> Repl<W> {
    pub fn new(
        assistant: SessionAssistant,
        presenter: Presenter<W>,
        cfg: Config,
        config_path: PathBuf,
    ) -> Self {
        Self {
            assistant,
            presenter,
            cfg,
            config_path,
        }
    }

    /// Handle one line of input.
    pub fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        if line.eq_ignore_ascii_case("quit") {
            return Ok(Flow::Quit);
        }
        if let Some(command) = line.strip_prefix('/') {
            return self.command(command);
        }
        self.ask(line)?;
        Ok(Flow::Continue)
    }

    fn ask(&mut self, question: &str) -> io::Result<()> {
        match self.assistant.resolve(question) {
            Ok(turn) => {
                match &turn.origin {
                    Origin::Memory { score } => debug!(score, "reused stored answer"),
                    Origin::Source(name) => debug!(source = %name, "fresh answer"),
                    Origin::NoAnswer => debug!(question = %turn.question, "unanswered"),
                }
                self.presenter.present(turn.answer.as_deref())
            }
            Err(e) => {
                // Storage trouble ends the turn, not the session.
                let out = self.presenter.writer_mut();
                writeln!(out, "{}: {}", "Memory error".red(), e)
            }
        }
    }

    fn command(&mut self, command: &str) -> io::Result<Flow> {
        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next();
        match name {
            "help" => self.cmd_help()?,
            "settings" => self.cmd_settings()?,
            "models" => self.cmd_models()?,
            "memory" => self.cmd_memory()?,
            "language" => self.cmd_language(arg)?,
            "quit" | "exit" => return Ok(Flow::Quit),
            other => {
                let out = self.presenter.writer_mut();
                writeln!(
                    out,
                    "{} '/{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                )?;
            }
        }
        Ok(Flow::Continue)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Command handlers
    // ─────────────────────────────────────────────────────────────────────────

    fn cmd_help(&mut self) -> io::Result<()> {
        let out = self.presenter.writer_mut();
        writeln!(out)?;
        writeln!(out, "{}", "Mnemo Commands".bold().underline())?;
        writeln!(out, "  Type any question to get an answer.")?;
        writeln!(out, "  {}        – edit ~/.mnemo/config.toml settings", "/settings".bold().cyan())?;
        writeln!(out, "  {}          – list and switch local models", "/models".bold().cyan())?;
        writeln!(out, "  {}          – list stored questions", "/memory".bold().cyan())?;
        writeln!(out, "  {} – switch english / russian", "/language [lang]".bold().cyan())?;
        writeln!(out, "  {}    – exit (or type quit)", "/quit  /exit".bold().cyan())?;
        writeln!(out)
    }

    fn cmd_memory(&mut self) -> io::Result<()> {
        let store = self.assistant.describe_store();
        let records = self.assistant.records();
        let out = self.presenter.writer_mut();
        writeln!(out, "{} ({})", "Stored Questions".bold().underline(), store.dimmed())?;
        if records.is_empty() {
            writeln!(out, "  {}", "memory is empty".dimmed())?;
        }
        for (i, record) in records.iter().enumerate() {
            writeln!(out, "  {:>4}  {}", i + 1, record.question)?;
        }
        Ok(())
    }

    fn cmd_language(&mut self, arg: Option<&str>) -> io::Result<()> {
        let raw = match arg {
            Some(a) => a.to_string(),
            None => {
                writeln!(self.presenter.writer_mut(), "  1) English\n  2) Russian")?;
                prompt_str("  Language [1]: ", "1")
            }
        };
        let Some(language) = Language::from_choice(&raw).or_else(|| Language::parse(&raw)) else {
            let out = self.presenter.writer_mut();
            return writeln!(
                out,
                "{} '{}', keeping {}",
                "Unknown language:".yellow(),
                raw,
                self.cfg.language
            );
        };

        self.cfg.language = language;
        self.apply_config();
        let saved = config::save_to(&self.cfg, &self.config_path);
        let out = self.presenter.writer_mut();
        writeln!(out, "{} {}", "✓ Language set to".green(), language.to_string().bold())?;
        if let Err(e) = saved {
            writeln!(out, "{}: {}", "Error saving config".red(), e)?;
        }
        Ok(())
    }

    fn cmd_settings(&mut self) -> io::Result<()> {
        let mut cfg = self.cfg.clone();
        writeln!(self.presenter.writer_mut(), "{}", "Settings Editor".bold().underline())?;

        let matcher = prompt_str(
            &format!("  Matcher (exact / fuzzy / threshold / semantic) [{}]: ", cfg.matcher),
            &cfg.matcher.to_string(),
        );
        match MatchStrategy::parse(&matcher) {
            Some(m) => cfg.matcher = m,
            None => writeln!(
                self.presenter.writer_mut(),
                "  {} '{}' is not a matcher, keeping {}",
                "Warning:".yellow(),
                matcher,
                cfg.matcher
            )?,
        }

        cfg.spell_check = prompt_bool("  Spell check", cfg.spell_check);
        cfg.speech = prompt_bool("  Speech", cfg.speech);

        let width = prompt_str(&format!("  Wrap width [{}]: ", cfg.wrap_width), &cfg.wrap_width.to_string());
        match width.parse::<usize>() {
            Ok(w) if w > 0 => cfg.wrap_width = w,
            _ => writeln!(
                self.presenter.writer_mut(),
                "  {} '{}' is not a valid width, keeping {}",
                "Warning:".yellow(),
                width,
                cfg.wrap_width
            )?,
        }

        cfg.active_model = prompt_str(&format!("  Active model [{}]: ", cfg.active_model), &cfg.active_model);

        self.cfg = cfg;
        self.apply_config();
        let out = self.presenter.writer_mut();
        match config::save_to(&self.cfg, &self.config_path) {
            Ok(()) => writeln!(
                out,
                "{} {}",
                "✓ Settings saved to".green(),
                self.config_path.display().to_string().bold()
            ),
            Err(e) => writeln!(out, "{}: {}", "Error saving config".red(), e),
        }
    }

    fn cmd_models(&mut self) -> io::Result<()> {
        let url = self.cfg.ollama_url.clone();
        let active = self.cfg.active_model.clone();
        {
            let out = self.presenter.writer_mut();
            writeln!(out, "{}", "Local Models".bold().underline())?;
            writeln!(out, "  Active model : {}", active.yellow())?;
            write!(out, "  Probing Ollama at {} … ", url.dimmed())?;
            out.flush()?;
        }

        let models = match ollama::fetch_models(&url) {
            Ok(models) if models.is_empty() => {
                let out = self.presenter.writer_mut();
                writeln!(out, "{}", "no models found".yellow())?;
                return writeln!(out, "  Run `ollama pull {}` to download a model.", active);
            }
            Ok(models) => models,
            Err(e) => {
                let out = self.presenter.writer_mut();
                writeln!(out, "{}", "offline".red())?;
                writeln!(out, "  {}", e.dimmed())?;
                return writeln!(out, "  Is Ollama running?  Try: ollama serve");
            }
        };

        {
            let out = self.presenter.writer_mut();
            writeln!(out, "{}", "online".green())?;
            for m in &models {
                let marker = if m.name == active { "▶" } else { " " };
                writeln!(out, "    {} {}", marker.green(), m.name.bold())?;
            }
        }

        let choice = prompt_str(&format!("  Switch to model [{}]: ", active), &active);
        if choice == active {
            return Ok(());
        }
        if !models.iter().any(|m| m.name == choice) {
            let out = self.presenter.writer_mut();
            return writeln!(out, "{} '{}'", "Unknown model:".red(), choice.yellow());
        }
        self.cfg.active_model = choice.clone();
        self.apply_config();
        let out = self.presenter.writer_mut();
        match config::save_to(&self.cfg, &self.config_path) {
            Ok(()) => writeln!(out, "{} {}", "✓ Active model set to".green(), choice.bold()),
            Err(e) => writeln!(out, "{}: {}", "Error saving config".red(), e),
        }
    }

    /// Push the current config into the live assistant and presenter.
    fn apply_config(&mut self) {
        self.assistant.set_matcher(self.cfg.matcher.build());
        self.assistant.set_spell_check(self.cfg.spell_check);
        self.assistant.set_sources(wiring::build_sources(&self.cfg));
        self.presenter.set_width(self.cfg.wrap_width);
        self.presenter.set_speaker(wiring::build_speaker(&self.cfg));
        self.presenter.set_language(self.cfg.language);
    }

    #[cfg(test)]
    fn config(&self) -> &Config {
        &self.cfg
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.presenter.into_inner()
    }
}

/// Entry point for the interactive loop.
///
/// `shutdown` is polled each iteration; when set the loop exits cleanly.
pub fn run<W: Write>(repl: &mut Repl<W>, shutdown: Arc<AtomicBool>) -> Result<(), ReadlineError> {
    let mut editor = DefaultEditor::new()?;

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let line = match editor.readline("mnemo> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e),
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }

        match repl.handle_line(&line) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => warn!(error = %e, "console write failed"),
        }
    }

    println!("{}", "Goodbye.".green());
    shutdown.store(true, Ordering::SeqCst);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Prompt for a string value. Returns `default` when the user presses Enter.
pub(crate) fn prompt_str(msg: &str, default: &str) -> String {
    print!("{}", msg);
    io::stdout().flush().ok();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let trimmed = line.trim().to_string();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed
            }
        }
        Err(_) => default.to_string(),
    }
}

fn prompt_bool(label: &str, default: bool) -> bool {
    let shown = if default { "Y/n" } else { "y/N" };
    let raw = prompt_str(&format!("{} [{}]: ", label, shown), "");
    match raw.to_lowercase().as_str() {
        "y" | "yes" | "on" | "true" => true,
        "n" | "no" | "off" | "false" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_memory::{MemoryStore, StoreBackend};
    use mnemo_runtime::SilentSpeaker;
    use mnemo_types::Record;

    fn repl_with(records: &[Record]) -> (Repl<Vec<u8>>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("memory.json");
        mnemo_memory::JsonStore::new(&store_path).save(records).unwrap();

        let cfg = Config {
            store_backend: StoreBackend::Json,
            store_path: Some(store_path),
            matcher: MatchStrategy::Fuzzy,
            sources: Vec::new(),
            speech: false,
            ..Config::default()
        };
        let assistant = wiring::build_assistant(&cfg).unwrap();
        let presenter = Presenter::new(Vec::new(), cfg.wrap_width, Box::new(SilentSpeaker), cfg.language);
        let config_path = dir.path().join("config.toml");
        (Repl::new(assistant, presenter, cfg, config_path), dir)
    }

    fn output(repl: Repl<Vec<u8>>) -> String {
        String::from_utf8(repl.into_output()).unwrap()
    }

    #[test]
    fn quit_sentinel_is_case_insensitive() {
        let (mut repl, _dir) = repl_with(&[]);
        assert_eq!(repl.handle_line("quit").unwrap(), Flow::Quit);
        assert_eq!(repl.handle_line("  QuIt ").unwrap(), Flow::Quit);
        assert_eq!(repl.handle_line("/exit").unwrap(), Flow::Quit);
        assert_eq!(repl.handle_line("/quit").unwrap(), Flow::Quit);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let (mut repl, _dir) = repl_with(&[]);
        assert_eq!(repl.handle_line("   ").unwrap(), Flow::Continue);
        assert!(output(repl).is_empty());
    }

    #[test]
    fn question_is_answered_from_memory() {
        let (mut repl, _dir) =
            repl_with(&[Record::new("What is the capital of France?", "Paris")]);
        assert_eq!(
            repl.handle_line("what is the capital of france").unwrap(),
            Flow::Continue
        );
        assert_eq!(output(repl), "Paris\n");
    }

    #[test]
    fn unanswerable_question_prints_notice() {
        let (mut repl, _dir) = repl_with(&[]);
        repl.handle_line("What is a snark?").unwrap();
        assert!(output(repl).contains("could not find an answer"));
    }

    #[test]
    fn memory_command_lists_questions() {
        let (mut repl, _dir) = repl_with(&[
            Record::new("Who wrote Hamlet?", "Shakespeare"),
            Record::new("What is the capital of France?", "Paris"),
        ]);
        repl.handle_line("/memory").unwrap();
        let out = output(repl);
        assert!(out.contains("1  Who wrote Hamlet?"));
        assert!(out.contains("2  What is the capital of France?"));
    }

    #[test]
    fn language_command_switches_and_saves() {
        let (mut repl, dir) = repl_with(&[]);
        repl.handle_line("/language 2").unwrap();
        assert_eq!(repl.config().language, Language::Russian);

        let saved = config::load_from(&dir.path().join("config.toml")).unwrap().unwrap();
        assert_eq!(saved.language, Language::Russian);

        repl.handle_line("/language english").unwrap();
        assert_eq!(repl.config().language, Language::English);
    }

    #[test]
    fn unknown_language_keeps_current() {
        let (mut repl, _dir) = repl_with(&[]);
        repl.handle_line("/language klingon").unwrap();
        assert_eq!(repl.config().language, Language::English);
        assert!(output(repl).contains("klingon"));
    }

    #[test]
    fn unknown_command_is_reported() {
        let (mut repl, _dir) = repl_with(&[]);
        assert_eq!(repl.handle_line("/frobnicate").unwrap(), Flow::Continue);
        assert!(output(repl).contains("frobnicate"));
    }

    #[test]
    fn help_lists_commands() {
        let (mut repl, _dir) = repl_with(&[]);
        repl.handle_line("/help").unwrap();
        let out = output(repl);
        for cmd in ["/settings", "/models", "/memory", "/language", "/quit"] {
            assert!(out.contains(cmd), "missing {cmd}");
        }
    }
}
