//! CLI argument definitions for flagbind.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// flagbind - Show how flags, environment and config files resolve.
///
/// Every setting is reported with the source that won. Flags only win when
/// given explicitly; otherwise their defaults rank below everything else.
#[derive(Parser, Debug)]
#[command(name = "flagbind")]
#[command(author, version, about = "Resolve layered configuration from flags, env and config files", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Config file to read (TOML, KDL or JSON).
    /// Defaults to config.toml in FLAGBIND_CONFIG_DIR or the user config directory.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Prefix for environment variables (PREFIX_HOST, PREFIX_PORT, ...)
    #[arg(long = "env-prefix", default_value = "FLAGBIND")]
    pub env_prefix: String,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Settings bound into the resolver.
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// Host to serve on
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Port to serve on
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Tag to attach (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show every resolved setting and its source (default)
    Show,

    /// Resolve a single key
    Get {
        /// Key to resolve (case-insensitive, dotted for nested tables)
        key: String,
    },

    /// List every known key, sorted
    Keys,
}
