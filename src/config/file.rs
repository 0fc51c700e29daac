//! Config file loading.
//!
//! Files are read into a flat map of dotted keys to JSON values, which is
//! what the resolver's config-file tier consumes:
//!
//! ```toml
//! host = "db.internal"
//! [server]
//! port = 9000
//! ```
//!
//! becomes `host = "db.internal"`, `server.port = 9000`.
//!
//! The same document in KDL:
//!
//! ```kdl
//! host "db.internal"
//! server {
//!     port 9000
//! }
//! ```
//!
//! A KDL node with several arguments yields an array; named properties nest
//! like children (`server port=9000`).

use std::collections::BTreeMap;
use std::path::Path;

use kdl::{KdlDocument, KdlNode, KdlValue};
use serde_json::{Map, Number, Value};

use crate::{Error, Result};

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Kdl,
    Json,
}

impl ConfigFormat {
    /// Parse from a format name or file extension, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "kdl" => Some(ConfigFormat::Kdl),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
            .ok_or_else(|| Error::UnsupportedConfigFormat(path.display().to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Kdl => "kdl",
            ConfigFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read and flatten a config file, detecting its format from the extension.
pub fn load_file(path: &Path) -> Result<BTreeMap<String, Value>> {
    let format = ConfigFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    parse_str(format, &content)
}

/// Parse and flatten config text in the given format.
pub fn parse_str(format: ConfigFormat, content: &str) -> Result<BTreeMap<String, Value>> {
    let tree = match format {
        ConfigFormat::Toml => toml_to_json(toml::Value::Table(content.parse::<toml::Table>()?)),
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Kdl => {
            let doc: KdlDocument = content
                .parse()
                .map_err(|e| Error::Kdl(format!("{}", e)))?;
            kdl_document_to_json(&doc)
        }
    };

    let mut flat = BTreeMap::new();
    flatten("", tree, &mut flat);
    Ok(flat)
}

fn flatten(prefix: &str, value: Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, child, out);
            }
        }
        other if !prefix.is_empty() => {
            out.insert(prefix.to_string(), other);
        }
        _ => {}
    }
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

fn kdl_document_to_json(doc: &KdlDocument) -> Value {
    let mut map = Map::new();
    for node in doc.nodes() {
        if let Some(value) = kdl_node_to_json(node) {
            map.insert(node.name().value().to_string(), value);
        }
    }
    Value::Object(map)
}

fn kdl_node_to_json(node: &KdlNode) -> Option<Value> {
    let mut arguments = Vec::new();
    let mut nested = Map::new();

    for entry in node.entries() {
        match entry.name() {
            Some(name) => {
                nested.insert(name.value().to_string(), kdl_value_to_json(entry.value()));
            }
            None => arguments.push(kdl_value_to_json(entry.value())),
        }
    }

    if let Some(children) = node.children()
        && let Value::Object(child_map) = kdl_document_to_json(children)
    {
        nested.extend(child_map);
    }

    if !nested.is_empty() {
        if !arguments.is_empty() {
            tracing::warn!(
                "KDL node '{}' mixes arguments with children; arguments ignored",
                node.name().value()
            );
        }
        return Some(Value::Object(nested));
    }

    match arguments.len() {
        0 => None,
        1 => arguments.pop(),
        _ => Some(Value::Array(arguments)),
    }
}

fn kdl_value_to_json(value: &KdlValue) -> Value {
    if let Some(s) = value.as_string() {
        Value::String(s.to_string())
    } else if let Some(i) = value.as_integer() {
        i64::try_from(i)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(i.to_string()))
    } else if let Some(f) = value.as_float() {
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    } else if let Some(b) = value.as_bool() {
        Value::Bool(b)
    } else {
        Value::Null
    }
}
