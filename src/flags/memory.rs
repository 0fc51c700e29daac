//! In-memory flag facility.
//!
//! [`StaticFlagSet`] holds literal flags and satisfies the flag capabilities
//! without any parsing library behind it. It is the test double for resolver
//! code and a way to bind flags that were defined programmatically.

use super::{FlagValue, FlagValueSet};
use crate::{Error, Result};

/// A literal flag with a default value and a changed marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFlag {
    name: String,
    value: String,
    value_type: String,
    changed: bool,
}

impl StaticFlag {
    /// Create a flag holding its default value.
    pub fn new(
        name: impl Into<String>,
        default_value: impl Into<String>,
        value_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: default_value.into(),
            value_type: value_type.into(),
            changed: false,
        }
    }

    /// Record an explicit value. The flag is marked changed even when the
    /// value equals the default.
    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.changed = true;
    }
}

impl FlagValue for StaticFlag {
    fn has_changed(&self) -> bool {
        self.changed
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn value_string(&self) -> String {
        self.value.clone()
    }

    fn value_type(&self) -> &str {
        &self.value_type
    }
}

/// An ordered collection of [`StaticFlag`]s with unique names.
#[derive(Debug, Clone, Default)]
pub struct StaticFlagSet {
    flags: Vec<StaticFlag>,
}

impl StaticFlagSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flag. Names must be unique.
    pub fn insert(&mut self, flag: StaticFlag) -> Result<()> {
        if self.get(&flag.name).is_some() {
            return Err(Error::DuplicateFlag(flag.name));
        }
        self.flags.push(flag);
        Ok(())
    }

    /// Explicitly set a registered flag.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let flag = self
            .flags
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| Error::UnknownFlag(name.to_string()))?;
        flag.set(value);
        Ok(())
    }

    /// Look up a flag by name.
    pub fn get(&self, name: &str) -> Option<&StaticFlag> {
        self.flags.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl FlagValueSet for StaticFlagSet {
    fn visit_all(&self, visit: &mut dyn FnMut(&dyn FlagValue)) {
        for flag in &self.flags {
            visit(flag);
        }
    }
}
