//! Command implementations for the flagbind CLI.
//!
//! - [`build_resolver`] - wires parsed flags, environment and config file
//! - [`show`], [`get`], [`keys`] - the subcommands

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{ArgMatches, Args, Command};
use serde::Serialize;
use serde_json::Value;

use crate::cli::{Cli, SettingsArgs};
use crate::config::{Resolved, Resolver};
use crate::flags::ClapValueSet;
use crate::{Error, Result};

/// Environment variable naming the directory holding the default config.toml.
pub const CONFIG_DIR_ENV: &str = "FLAGBIND_CONFIG_DIR";

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// One setting as reported by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingEntry {
    pub value: Value,
    pub source: String,
}

impl From<Resolved<Value>> for SettingEntry {
    fn from(resolved: Resolved<Value>) -> Self {
        Self {
            value: resolved.value,
            source: resolved.source.to_string(),
        }
    }
}

/// Result of `flagbind show`.
#[derive(Debug, Serialize)]
pub struct ShowResult {
    pub config_file: Option<PathBuf>,
    pub settings: BTreeMap<String, SettingEntry>,
}

impl Output for ShowResult {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        match self.config_file {
            Some(ref path) => lines.push(format!("Config file: {}", path.display())),
            None => lines.push("Config file: (none)".to_string()),
        }
        for (key, entry) in &self.settings {
            lines.push(format!("{} = {} ({})", key, entry.value, entry.source));
        }
        lines.join("\n")
    }
}

/// Result of `flagbind get`.
#[derive(Debug, Serialize)]
pub struct GetResult {
    pub key: String,
    #[serde(flatten)]
    pub entry: SettingEntry,
}

impl Output for GetResult {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn to_human(&self) -> String {
        let rendered = match self.entry.value {
            Value::String(ref s) => s.clone(),
            ref other => other.to_string(),
        };
        format!("{} ({})", rendered, self.entry.source)
    }
}

/// Result of `flagbind keys`.
#[derive(Debug, Serialize)]
pub struct KeysResult {
    pub keys: Vec<String>,
}

impl Output for KeysResult {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn to_human(&self) -> String {
        self.keys.join("\n")
    }
}

/// A resolver wired up from the command line.
#[derive(Debug)]
pub struct Session {
    pub resolver: Resolver,
    pub config_file: Option<PathBuf>,
}

/// Build the resolver for one invocation.
///
/// Only the [`SettingsArgs`] flags are bound; the control flags (`--config`,
/// `--env-prefix`, `--human`) are not settings.
pub fn build_resolver(cli: &Cli, matches: &ArgMatches) -> Result<Session> {
    let mut resolver = Resolver::new();
    resolver.set_env_prefix(cli.env_prefix.as_str());
    resolver.automatic_env();

    let settings = SettingsArgs::augment_args(Command::new("settings"));
    resolver.bind_flag_values(&ClapValueSet::new(&settings, matches)?);

    let config_file = config_file_path(cli.config.as_deref())?;
    if let Some(ref path) = config_file {
        resolver.read_config_file(path)?;
    }

    Ok(Session {
        resolver,
        config_file,
    })
}

/// Locate the config file.
///
/// Priority: explicit path (must exist) > `$FLAGBIND_CONFIG_DIR/config.toml`
/// > `<user config dir>/flagbind/config.toml`. The implicit locations are
/// only used when the file exists.
pub fn config_file_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Other(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let dir = std::env::var_os(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join("flagbind")));

    Ok(dir
        .map(|d| d.join("config.toml"))
        .filter(|path| path.exists()))
}

/// Resolve every known setting.
pub fn show(session: &Session) -> Result<ShowResult> {
    let settings = session
        .resolver
        .all_settings()?
        .into_iter()
        .map(|(key, resolved)| (key, SettingEntry::from(resolved)))
        .collect();

    Ok(ShowResult {
        config_file: session.config_file.clone(),
        settings,
    })
}

/// Resolve one key.
pub fn get(session: &Session, key: &str) -> Result<GetResult> {
    let resolved = session
        .resolver
        .resolve(key)?
        .ok_or_else(|| Error::Other(format!("Key not found: {}", key)))?;

    Ok(GetResult {
        key: key.to_lowercase(),
        entry: resolved.into(),
    })
}

/// List every known key.
pub fn keys(session: &Session) -> KeysResult {
    KeysResult {
        keys: session.resolver.all_keys(),
    }
}
