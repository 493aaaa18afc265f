pub mod config;
pub mod doctor;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use ogw_domain::config::Config;

/// ogw-gateway — an Observability Gateway JSON-RPC tool server.
#[derive(Debug, Parser)]
#[command(name = "ogw-gateway", version, about)]
pub struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Run diagnostic checks against the current configuration.
    Doctor,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Loads the config from `path`, falling back to defaults (plus `OGW_*`
/// env overrides) when the file does not exist, mirroring the teacher's
/// `load_config` shared by `serve`/`doctor`/`config`.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::load_or_default(path).map_err(|e| anyhow::anyhow!("loading {}: {e}", path.display()))
}
