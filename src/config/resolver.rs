//! Precedence resolution across flags, environment, config files and defaults.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. Overrides set in code (`Resolver::set`)
//! 2. Flags the user explicitly set (`FlagValue::has_changed`)
//! 3. Environment variables (explicit bindings or automatic `PREFIX_KEY`)
//! 4. Config files
//! 5. Defaults (`Resolver::set_default`)
//! 6. Default values of flags the user did not set
//!
//! Tier 2 vs tier 6 is why flags carry a changed marker: an unset flag still
//! has a value, but it must not shadow the environment or a config file.
//!
//! Keys are case-insensitive. Nested config tables are addressed with dotted
//! keys (`server.port`).

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Error, Result};
use crate::config::coerce::{coerce, type_tag_of};
use crate::config::file::{ConfigFormat, load_file, parse_str};
use crate::flags::{FlagValue, FlagValueSet};

/// Reads one environment variable.
pub type EnvLookup = Box<dyn Fn(&str) -> Option<String>>;

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value set in code, above every other source
    Override,
    /// Flag explicitly set on the command line
    Flag,
    /// Value from environment variable
    EnvVar(String),
    /// Value from a config file (path, or `<inline FORMAT>`)
    ConfigFile(String),
    /// Default registered with the resolver
    Default,
    /// Default value of a flag the user did not set
    FlagDefault,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::Override => write!(f, "override"),
            ValueSource::Flag => write!(f, "flag"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile(origin) => write!(f, "config:{}", origin),
            ValueSource::Default => write!(f, "default"),
            ValueSource::FlagDefault => write!(f, "flag-default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// The facts the resolver keeps about one bound flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundFlag {
    pub name: String,
    pub value: String,
    pub value_type: String,
    pub changed: bool,
}

impl BoundFlag {
    /// Capture a flag's current facts.
    pub fn from_flag(flag: &dyn FlagValue) -> Self {
        Self {
            name: flag.name().to_string(),
            value: flag.value_string(),
            value_type: flag.value_type().to_string(),
            changed: flag.has_changed(),
        }
    }

    fn typed_value(&self) -> Result<Value> {
        coerce(&self.value, &self.value_type)
    }
}

#[derive(Debug, Clone)]
struct ConfigEntry {
    value: Value,
    origin: String,
}

/// Layered configuration resolver.
pub struct Resolver {
    overrides: BTreeMap<String, Value>,
    flags: BTreeMap<String, BoundFlag>,
    env_bindings: BTreeMap<String, Vec<String>>,
    env_prefix: Option<String>,
    automatic_env: bool,
    allow_empty_env: bool,
    env_lookup: EnvLookup,
    config: BTreeMap<String, ConfigEntry>,
    defaults: BTreeMap<String, Value>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("overrides", &self.overrides)
            .field("flags", &self.flags)
            .field("env_bindings", &self.env_bindings)
            .field("env_prefix", &self.env_prefix)
            .field("automatic_env", &self.automatic_env)
            .field("allow_empty_env", &self.allow_empty_env)
            .field("config", &self.config)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    /// Create a resolver reading the process environment.
    pub fn new() -> Self {
        Self {
            overrides: BTreeMap::new(),
            flags: BTreeMap::new(),
            env_bindings: BTreeMap::new(),
            env_prefix: None,
            automatic_env: false,
            allow_empty_env: false,
            env_lookup: Box::new(|name| std::env::var(name).ok()),
            config: BTreeMap::new(),
            defaults: BTreeMap::new(),
        }
    }

    /// Replace the environment reader.
    pub fn with_env_lookup(mut self, lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        self.env_lookup = Box::new(lookup);
        self
    }

    /// Prefix for automatically derived environment variable names.
    pub fn set_env_prefix(&mut self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        self.env_prefix = if prefix.is_empty() {
            None
        } else {
            Some(prefix.to_uppercase())
        };
    }

    /// Look up every key in the environment as `PREFIX_KEY`.
    pub fn automatic_env(&mut self) {
        self.automatic_env = true;
    }

    /// Treat set-but-empty environment variables as values instead of unset.
    pub fn allow_empty_env(&mut self, allow: bool) {
        self.allow_empty_env = allow;
    }

    /// Bind a key to environment variables, checked in order.
    ///
    /// With no names, the key's automatic name (`PREFIX_KEY`) is bound.
    pub fn bind_env(&mut self, key: &str, names: &[&str]) {
        let key = normalize_key(key);
        let names = if names.is_empty() {
            vec![self.env_key(&key)]
        } else {
            names.iter().map(|n| n.to_string()).collect()
        };
        self.env_bindings.insert(key, names);
    }

    /// Register a default for a key.
    pub fn set_default(&mut self, key: &str, value: impl Into<Value>) {
        self.defaults.insert(normalize_key(key), value.into());
    }

    /// Override a key above every other source.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.overrides.insert(normalize_key(key), value.into());
    }

    /// Bind every flag in a set under its own name.
    pub fn bind_flag_values(&mut self, flags: &dyn FlagValueSet) {
        let mut bound = 0usize;
        let mut changed = 0usize;
        flags.visit_all(&mut |flag| {
            bound += 1;
            if flag.has_changed() {
                changed += 1;
            }
            self.bind_flag_value(flag.name(), flag);
        });
        tracing::debug!("Bound {} flags ({} set explicitly)", bound, changed);
    }

    /// Bind one flag under a chosen key.
    pub fn bind_flag_value(&mut self, key: &str, flag: &dyn FlagValue) {
        self.flags.insert(normalize_key(key), BoundFlag::from_flag(flag));
    }

    /// Merge a config file; later files win over earlier ones key by key.
    pub fn read_config_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let values = load_file(path)?;
        tracing::debug!("Loaded {} keys from {}", values.len(), path.display());
        self.merge_config(values, path.display().to_string());
        Ok(())
    }

    /// Merge config text in the given format.
    pub fn merge_config_str(&mut self, format: ConfigFormat, content: &str) -> Result<()> {
        let values = parse_str(format, content)?;
        self.merge_config(values, format!("<inline {}>", format));
        Ok(())
    }

    fn merge_config(&mut self, values: BTreeMap<String, Value>, origin: String) {
        for (key, value) in values {
            self.config.insert(
                normalize_key(&key),
                ConfigEntry {
                    value,
                    origin: origin.clone(),
                },
            );
        }
    }

    /// Resolve a key through the precedence chain.
    pub fn resolve(&self, key: &str) -> Result<Option<Resolved<Value>>> {
        let key = normalize_key(key);
        let resolved = self.find(&key, true)?;
        if let Some(ref r) = resolved {
            tracing::trace!("Resolved '{}' from {}", key, r.source);
        }
        Ok(resolved)
    }

    /// Resolve a key and deserialize it into `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(resolved) = self.resolve(key)? else {
            return Ok(None);
        };
        serde_json::from_value(resolved.value)
            .map(Some)
            .map_err(|e| Error::TypeMismatch {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    /// Resolve a key and render it as a string.
    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.resolve(key)?.map(|r| match r.value {
            Value::String(s) => s,
            other => other.to_string(),
        }))
    }

    /// Whether any source other than an unset flag's default provides `key`.
    ///
    /// Fails like [`Resolver::resolve`] when the winning value does not
    /// coerce, e.g. a malformed environment variable.
    pub fn is_set(&self, key: &str) -> Result<bool> {
        Ok(self.find(&normalize_key(key), false)?.is_some())
    }

    /// Every known key, sorted.
    ///
    /// Keys only reachable through automatic environment lookup are not
    /// listed; bind them with [`Resolver::bind_env`] or a default.
    pub fn all_keys(&self) -> Vec<String> {
        let keys: BTreeSet<&String> = self
            .overrides
            .keys()
            .chain(self.flags.keys())
            .chain(self.env_bindings.keys())
            .chain(self.config.keys())
            .chain(self.defaults.keys())
            .collect();
        keys.into_iter().cloned().collect()
    }

    /// Resolve every known key, sorted by key.
    pub fn all_settings(&self) -> Result<BTreeMap<String, Resolved<Value>>> {
        let mut settings = BTreeMap::new();
        for key in self.all_keys() {
            if let Some(resolved) = self.find(&key, true)? {
                settings.insert(key, resolved);
            }
        }
        Ok(settings)
    }

    fn find(&self, key: &str, flag_defaults: bool) -> Result<Option<Resolved<Value>>> {
        if let Some(value) = self.overrides.get(key) {
            return Ok(Some(Resolved::new(value.clone(), ValueSource::Override)));
        }

        let flag = self.flags.get(key);
        if let Some(flag) = flag.filter(|f| f.changed) {
            return Ok(Some(Resolved::new(flag.typed_value()?, ValueSource::Flag)));
        }

        if let Some((name, raw)) = self.lookup_env(key) {
            let value = match self.type_hint(key) {
                Some(tag) => coerce(&raw, tag)?,
                None => Value::String(raw),
            };
            return Ok(Some(Resolved::new(value, ValueSource::EnvVar(name))));
        }

        if let Some(entry) = self.config.get(key) {
            return Ok(Some(Resolved::new(
                entry.value.clone(),
                ValueSource::ConfigFile(entry.origin.clone()),
            )));
        }

        if let Some(value) = self.defaults.get(key) {
            return Ok(Some(Resolved::new(value.clone(), ValueSource::Default)));
        }

        match flag {
            Some(flag) if flag_defaults => Ok(Some(Resolved::new(
                flag.typed_value()?,
                ValueSource::FlagDefault,
            ))),
            _ => Ok(None),
        }
    }

    fn lookup_env(&self, key: &str) -> Option<(String, String)> {
        let names = match self.env_bindings.get(key) {
            Some(names) => names.clone(),
            None if self.automatic_env => vec![self.env_key(key)],
            None => return None,
        };

        names.into_iter().find_map(|name| {
            let value = (self.env_lookup)(&name)?;
            if value.is_empty() && !self.allow_empty_env {
                return None;
            }
            Some((name, value))
        })
    }

    fn type_hint(&self, key: &str) -> Option<&str> {
        self.flags
            .get(key)
            .map(|f| f.value_type.as_str())
            .or_else(|| self.defaults.get(key).and_then(type_tag_of))
    }

    fn env_key(&self, key: &str) -> String {
        let name = key.replace(['.', '-'], "_").to_uppercase();
        match self.env_prefix {
            Some(ref prefix) => format!("{}_{}", prefix, name),
            None => name,
        }
    }
}

fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}
