//! `mnemo-cli` – Mnemo Command Line Interface
//!
//! A question/answer assistant with a memory. This binary:
//!
//! 1. Checks for `~/.mnemo/config.toml`; runs a **First-Run Wizard** when the
//!    file is absent.
//! 2. Probes the local Ollama instance when the model source is enabled.
//! 3. Opens the memory store and drops the user into an **interactive REPL**
//!    where every line is a question (plus a few slash-commands).
//! 4. Intercepts **Ctrl-C** to finish the current turn and exit cleanly.

mod config;
mod ollama;
mod repl;
mod wiring;

use colored::Colorize;
use mnemo_memory::StoreBackend;
use mnemo_runtime::{Presenter, SourceKind};
use mnemo_types::Language;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, warn};

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // Defaults to "warn" so log lines do not interleave with answers.
    let _telemetry = mnemo_runtime::init_tracing("mnemo", "warn");

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – finishing the current turn …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    // ── First-Run Wizard ──────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => run_first_run_wizard(),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    // ── Ollama discovery ──────────────────────────────────────────────────
    if cfg.sources.contains(&SourceKind::Model) {
        print!("\n  Probing Ollama at {} … ", cfg.ollama_url.dimmed());
        std::io::stdout().flush().ok();
        match ollama::fetch_models(&cfg.ollama_url) {
            Ok(models) => {
                println!("{} ({} model(s) available)", "online".green(), models.len());
                if !models.iter().any(|m| m.name.starts_with(&cfg.active_model)) {
                    println!(
                        "  {} Model {} is not installed. Run `{}`.",
                        "Warning:".yellow(),
                        cfg.active_model.bold(),
                        format!("ollama pull {}", cfg.active_model).bold()
                    );
                }
            }
            Err(_) => {
                println!("{}", "offline".yellow());
                println!(
                    "  {}  Run `{}` to enable model answers.",
                    "No Ollama instance detected.".dimmed(),
                    "ollama serve".bold()
                );
            }
        }
    }

    // ── Memory ────────────────────────────────────────────────────────────
    let assistant = match wiring::build_assistant(&cfg) {
        Ok(a) => a,
        Err(e) => {
            error!(error = %e, "failed to open memory store");
            println!("{}: {}", "Could not open memory".red(), e);
            std::process::exit(1);
        }
    };
    println!(
        "  Memory: {} ({} stored answer(s))",
        assistant.describe_store().bold(),
        assistant.records().len()
    );
    println!();
    println!(
        "  Ask a question, or type {} for a list of commands.\n",
        "/help".bold().cyan()
    );

    // ── Interactive REPL ──────────────────────────────────────────────────
    let presenter = Presenter::new(
        std::io::stdout(),
        cfg.wrap_width,
        wiring::build_speaker(&cfg),
        cfg.language,
    );
    let mut session = repl::Repl::new(assistant, presenter, cfg, config::config_path());
    if let Err(e) = repl::run(&mut session, shutdown) {
        error!(error = %e, "terminal error");
        println!("{}: {}", "Terminal error".red(), e);
        std::process::exit(1);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard() -> config::Config {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║        Mnemo First-Run Wizard        ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's set up Mnemo.\n");

    let mut cfg = config::Config::default();

    // Language
    println!("  Which language will you ask in?");
    println!("    1) English  (default)");
    println!("    2) Russian");
    let choice = repl::prompt_str("  Enter choice [1]: ", "1");
    cfg.language = Language::from_choice(&choice).unwrap_or_else(|| {
        println!("  {} '{}', using English.", "Invalid choice".yellow(), choice);
        Language::English
    });

    // Answer source
    println!("  Where should new answers come from?");
    println!("    1) Encyclopedia first, then local model  (default)");
    println!("    2) Encyclopedia only");
    println!("    3) Local model only (Ollama)");
    let choice = repl::prompt_str("  Enter choice [1]: ", "1");
    cfg.sources = match choice.trim() {
        "2" => vec![SourceKind::Encyclopedia],
        "3" => vec![SourceKind::Model],
        _ => vec![SourceKind::Encyclopedia, SourceKind::Model],
    };

    // Store backend
    println!("  How should answers be remembered?");
    println!("    1) SQLite database  (default)");
    println!("    2) JSON file");
    let choice = repl::prompt_str("  Enter choice [1]: ", "1");
    cfg.store_backend = match choice.trim() {
        "2" => StoreBackend::Json,
        _ => StoreBackend::Sqlite,
    };

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    config::apply_env_overrides(&mut cfg);
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ____ ___  ____  ___  ____ ___  ____ "#.bold().cyan());
    println!("{}", r#"  / __ `__ \/ __ \/ _ \/ __ `__ \/ __ \"#.bold().cyan());
    println!("{}", r#" / / / / / / / / /  __/ / / / / / /_/ /"#.bold().cyan());
    println!("{}", r#"/_/ /_/ /_/_/ /_/\___/_/ /_/ /_/\____/ "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "Mnemo".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Question answering with a memory");
    println!();
}
