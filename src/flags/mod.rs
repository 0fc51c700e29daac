//! Flag capabilities consumed by the configuration resolver.
//!
//! A flag-parsing facility is bound to the resolver through two narrow,
//! read-only traits:
//!
//! - [`FlagValueSet`] - enumerates every flag registered with the facility
//! - [`FlagValue`] - exposes one flag's name, rendered value, type tag and
//!   whether the user explicitly set it
//!
//! ## Changed-ness
//!
//! [`FlagValue::has_changed`] is the only signal for "explicitly supplied on
//! this invocation". It must never be inferred from the value: a default can
//! be non-empty, and an explicit value can equal the default.
//!
//! ## Implementations
//!
//! - [`clap_flags::ClapValueSet`] - adapter over a parsed `clap` command
//! - [`memory::StaticFlagSet`] - in-memory facility, used as a test double

pub mod clap_flags;
pub mod memory;

pub use clap_flags::{ClapValue, ClapValueSet};
pub use memory::{StaticFlag, StaticFlagSet};

/// A set of flags that can be bound to the resolver.
///
/// Enumeration order is whatever the underlying facility uses. Callers must
/// not depend on it.
pub trait FlagValueSet {
    /// Invoke `visit` exactly once for every registered flag.
    fn visit_all(&self, visit: &mut dyn FnMut(&dyn FlagValue));
}

/// A single flag as seen by the resolver.
pub trait FlagValue {
    /// Whether the flag was explicitly set during parsing.
    fn has_changed(&self) -> bool;

    /// The registered flag name.
    fn name(&self) -> &str;

    /// The flag's current value rendered as a string.
    fn value_string(&self) -> String;

    /// Stable type tag (e.g. "string", "int64", "bool", "stringSlice").
    fn value_type(&self) -> &str;
}

impl<T: FlagValueSet + ?Sized> FlagValueSet for &T {
    fn visit_all(&self, visit: &mut dyn FnMut(&dyn FlagValue)) {
        (**self).visit_all(visit)
    }
}

impl<T: FlagValue + ?Sized> FlagValue for &T {
    fn has_changed(&self) -> bool {
        (**self).has_changed()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn value_string(&self) -> String {
        (**self).value_string()
    }

    fn value_type(&self) -> &str {
        (**self).value_type()
    }
}

/// Collect the names of every flag in a set, in enumeration order.
pub fn flag_names(set: &dyn FlagValueSet) -> Vec<String> {
    let mut names = Vec::new();
    set.visit_all(&mut |flag| names.push(flag.name().to_string()));
    names
}
