//! Layered configuration on top of the flag capabilities.
//!
//! ## Modules
//!
//! - [`resolver`] - precedence resolution with source tracking
//! - [`coerce`] - turns flag/env strings into typed values using type tags
//! - [`file`] - TOML, KDL and JSON config files flattened to dotted keys
//!
//! ## Precedence
//!
//! override > explicitly set flag > env var > config file > default > flag default

pub mod coerce;
pub mod file;
pub mod resolver;

pub use coerce::{coerce, type_tag_of};
pub use file::{ConfigFormat, load_file, parse_str};
pub use resolver::{BoundFlag, EnvLookup, Resolved, Resolver, ValueSource};
