//! flagbind - Bind command-line flags into a layered configuration resolver.
//!
//! The resolver never sees a flag-parsing library directly. It consumes the
//! narrow [`flags::FlagValueSet`] / [`flags::FlagValue`] capabilities, which
//! carry per flag its name, its string rendering, a type tag and whether the
//! user explicitly set it. That last fact decides whether a flag outranks the
//! environment and config files or only acts as a last-resort default.

pub mod cli;
pub mod commands;
pub mod config;
pub mod flags;

/// Library-level error type for flagbind operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse KDL: {0}")]
    Kdl(String),

    #[error("Unknown flag: {0}")]
    UnknownFlag(String),

    #[error("Flag already registered: {0}")]
    DuplicateFlag(String),

    #[error("Unsupported config format: {0}")]
    UnsupportedConfigFormat(String),

    #[error("Cannot read {value:?} as {value_type}: {reason}")]
    Coerce {
        value: String,
        value_type: String,
        reason: String,
    },

    #[error("Type mismatch for key '{key}': {reason}")]
    TypeMismatch { key: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for flagbind operations.
pub type Result<T> = std::result::Result<T, Error>;
