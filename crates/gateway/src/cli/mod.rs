pub mod config;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// triage: a support ticket triage agent.
#[derive(Debug, Parser)]
#[command(name = "triage", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Triage one ticket from a JSON file (or `-` for stdin) and print the result.
    Run {
        /// Path to a ticket JSON document.
        ticket: PathBuf,
        /// Print the full outcome (termination, rounds, token usage) instead of
        /// only the triage result.
        #[arg(long)]
        verbose: bool,
    },
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `TRIAGE_CONFIG` (or
/// `config.toml` by default). A missing file yields all defaults.
pub fn load_config() -> anyhow::Result<(tt_domain::config::Config, String)> {
    let config_path =
        std::env::var("TRIAGE_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        tt_domain::config::Config::default()
    };

    Ok((config, config_path))
}
