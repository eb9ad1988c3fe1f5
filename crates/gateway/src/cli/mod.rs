//! Command line interface.

pub mod config;

use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};

use tt_domain::config::Config;

/// Env var naming the config file; falls back to `config.toml`.
pub const CONFIG_ENV: &str = "TT_CONFIG";

/// TableTalk: chat over your database through a hosted SQL agent.
#[derive(Debug, Parser)]
#[command(name = "tabletalk", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (the default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report issues.
    Validate,
    /// Dump the resolved configuration (defaults applied) as TOML.
    Show,
}

/// Load the configuration and report which path was used.
///
/// A missing file is not an error: the gateway starts with built-in
/// defaults, which suit local development.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.toml".to_owned());
    if !Path::new(&path).exists() {
        tracing::info!(path = %path, "no config file found, using defaults");
        return Ok((Config::default(), path));
    }
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config: Config = toml::from_str(&raw).with_context(|| format!("parsing {path}"))?;
    Ok((config, path))
}
