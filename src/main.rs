//! CLI entry point for keybind-engine
//!
//! Loads an input conf into the user section of a fresh engine and reports
//! on the merged result: overridden rules, the resolved table, or how a
//! series of keystrokes would be handled.

use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use layered_keybind_engine::config::{load_input_conf, EngineConfig};
use layered_keybind_engine::{BindingEngine, BindingSnapshot, MatchOutcome};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keybind-engine")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report rules that were overridden or rejected
    Check {
        /// Path to input conf file
        #[arg(short, long, default_value = "~/.config/mpv/input.conf")]
        config: PathBuf,
    },

    /// List the resolved binding table
    List {
        /// Path to input conf file
        #[arg(short, long, default_value = "~/.config/mpv/input.conf")]
        config: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Feed keystrokes through a matcher and show each outcome
    Resolve {
        /// Path to input conf file
        #[arg(short, long, default_value = "~/.config/mpv/input.conf")]
        config: PathBuf,

        /// Keystrokes, in the order typed
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let clean = match cli.command {
        Commands::Check { config } => check_overrides(&config)?,
        Commands::List { config, json } => {
            list_bindings(&config, json)?;
            true
        }
        Commands::Resolve { config, keys } => {
            resolve_keys(&config, &keys)?;
            true
        }
    };

    if !clean {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Start an engine with `config_path` loaded as the user conf section.
fn load_engine(config_path: &Path) -> anyhow::Result<BindingEngine> {
    let rules = load_input_conf(config_path)?;
    let engine = BindingEngine::start(EngineConfig::default())?;
    engine.replace_user_conf_rules(rules, None)?;
    engine.flush()?;
    Ok(engine)
}

/// Print every disabled rule with its reason. Returns false if any.
fn check_overrides(config_path: &Path) -> anyhow::Result<bool> {
    println!("{} Loading input conf: {}", "→".cyan(), config_path.display());

    let engine = load_engine(config_path)?;
    let snapshot = engine.current_snapshot();

    println!(
        "{} Found {} bindings\n",
        "✓".green(),
        snapshot.user_section_len()
    );

    let overridden = snapshot.overridden();
    if overridden.is_empty() {
        println!("{} {}", "✓".green().bold(), "No overridden bindings!".bold());
        return Ok(true);
    }

    println!(
        "{} Found {} overridden binding{}:\n",
        "✗".red().bold(),
        overridden.len(),
        if overridden.len() == 1 { "" } else { "s" }
    );

    for (i, binding) in overridden.iter().enumerate() {
        println!(
            "  {} {} → {}",
            format!("{}.", i + 1).dimmed(),
            binding.rule.raw_key().cyan().bold(),
            binding.rule.readable_action()
        );
        if let Some(reason) = &binding.override_reason {
            println!("     {}", reason.yellow());
        }
    }

    Ok(false)
}

fn list_bindings(config_path: &Path, as_json: bool) -> anyhow::Result<()> {
    let engine = load_engine(config_path)?;
    let snapshot = engine.current_snapshot();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&snapshot_summary(&snapshot))?);
        return Ok(());
    }

    println!("{}", format!("Bindings from: {}\n", config_path.display()).bold());

    let resolved = snapshot.resolved();
    for binding in &resolved {
        let key = binding.key().cyan().bold();
        let section = format!("[{}]", binding.origin_section).dimmed();
        if binding.is_ignore() {
            println!("{} → {} {}", key, binding.rule.readable_action().dimmed(), section);
        } else {
            println!("{} → {} {}", key, binding.rule.readable_action().green(), section);
        }
    }

    println!("\n{} Total: {} keys", "✓".green(), resolved.len());

    Ok(())
}

fn snapshot_summary(snapshot: &BindingSnapshot) -> serde_json::Value {
    let bindings: Vec<serde_json::Value> = snapshot
        .resolved()
        .into_iter()
        .map(|binding| {
            json!({
                "key": binding.key(),
                "action": binding.rule.readable_action(),
                "section": binding.origin_section,
                "origin": binding.origin.to_string(),
            })
        })
        .collect();

    let overridden: Vec<serde_json::Value> = snapshot
        .overridden()
        .into_iter()
        .map(|binding| {
            json!({
                "key": binding.rule.raw_key(),
                "action": binding.rule.readable_action(),
                "section": binding.origin_section,
                "reason": binding.override_reason,
            })
        })
        .collect();

    json!({
        "version": snapshot.version(),
        "bindings": bindings,
        "overridden": overridden,
    })
}

fn resolve_keys(config_path: &Path, keys: &[String]) -> anyhow::Result<()> {
    let engine = load_engine(config_path)?;
    let mut context = engine.new_context();

    for key in keys {
        let outcome = match context.resolve(key) {
            MatchOutcome::Execute(rule) => format!("{} {}", "execute".green().bold(), rule.readable_action()),
            MatchOutcome::Suppress => "suppress (partial sequence)".yellow().to_string(),
            MatchOutcome::Unrecognized => "unrecognized".red().to_string(),
        };
        println!("{} → {}", key.cyan().bold(), outcome);
    }

    Ok(())
}
