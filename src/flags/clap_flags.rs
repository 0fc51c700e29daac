//! Adapter from a parsed `clap` command to the flag capabilities.
//!
//! A [`ClapValueSet`] borrows the [`Command`] that defines the flags and the
//! [`ArgMatches`] it produced. Every accessor forwards to clap:
//!
//! - changed-ness is `ArgMatches::value_source == ValueSource::CommandLine`,
//!   so values filled in from clap's `env` fallback or `default_value` are
//!   reported as unchanged
//! - the name is the argument id as registered
//! - the value is clap's raw value; multi-valued flags render as `[a,b]`
//! - the type tag comes from the argument's action and value parser
//!
//! Positional arguments and the generated help/version switches are not
//! flags and are skipped.

use std::any::TypeId;
use std::borrow::Cow;
use std::ffi::OsString;
use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

use super::{FlagValue, FlagValueSet};
use crate::{Error, Result};

/// Non-owning view over a clap command and its parse result.
///
/// The command and matches must outlive the adapter; the borrow checker
/// enforces it.
#[derive(Debug, Clone, Copy)]
pub struct ClapValueSet<'a> {
    command: &'a Command,
    matches: &'a ArgMatches,
}

impl<'a> ClapValueSet<'a> {
    /// Bind a command definition to the matches it produced.
    ///
    /// For a subcommand, pass the subcommand's `Command` together with its
    /// own `ArgMatches`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFlag`] when `matches` does not know one of the
    /// command's flags, i.e. it came from a different command. clap only
    /// tracks valid ids in debug builds, so release builds accept the pair
    /// unchecked.
    pub fn new(command: &'a Command, matches: &'a ArgMatches) -> Result<Self> {
        for arg in flag_args(command) {
            let id = arg.get_id().as_str();
            if matches.try_contains_id(id).is_err() {
                return Err(Error::UnknownFlag(id.to_string()));
            }
        }
        Ok(Self { command, matches })
    }
}

impl FlagValueSet for ClapValueSet<'_> {
    fn visit_all(&self, visit: &mut dyn FnMut(&dyn FlagValue)) {
        for arg in flag_args(self.command) {
            visit(&ClapValue::new(arg, self.matches));
        }
    }
}

/// Non-owning view over one clap argument.
#[derive(Debug, Clone, Copy)]
pub struct ClapValue<'a> {
    arg: &'a Arg,
    matches: &'a ArgMatches,
    value_type: &'static str,
}

impl<'a> ClapValue<'a> {
    fn new(arg: &'a Arg, matches: &'a ArgMatches) -> Self {
        Self {
            arg,
            matches,
            value_type: value_type_of(arg),
        }
    }

    fn id(&self) -> &'a str {
        self.arg.get_id().as_str()
    }

    fn parsed_bools(&self) -> Option<Vec<bool>> {
        if !matches!(self.value_type, "bool" | "boolSlice") {
            return None;
        }
        self.matches
            .try_get_many::<bool>(self.id())
            .ok()
            .map(|values| values.into_iter().flatten().copied().collect())
    }
}

impl FlagValue for ClapValue<'_> {
    fn has_changed(&self) -> bool {
        self.matches.value_source(self.id()) == Some(ValueSource::CommandLine)
    }

    fn name(&self) -> &str {
        self.id()
    }

    fn value_string(&self) -> String {
        // Boolish parsers accept `yes`/`off`/...; render the parsed bool.
        let raw: Vec<Cow<'_, str>> = match self.parsed_bools() {
            Some(values) => values
                .into_iter()
                .map(|b| Cow::Borrowed(if b { "true" } else { "false" }))
                .collect(),
            None => self
                .matches
                .get_raw(self.id())
                .map(|values| values.map(|v| v.to_string_lossy()).collect())
                .unwrap_or_default(),
        };

        if is_multi(self.arg) {
            render_list(&raw)
        } else {
            raw.last().map(|v| v.to_string()).unwrap_or_default()
        }
    }

    fn value_type(&self) -> &str {
        self.value_type
    }
}

fn flag_args(command: &Command) -> impl Iterator<Item = &Arg> {
    command
        .get_arguments()
        .filter(|arg| !arg.is_positional() && !is_builtin(arg))
}

fn is_builtin(arg: &Arg) -> bool {
    matches!(
        arg.get_action(),
        ArgAction::Help | ArgAction::HelpShort | ArgAction::HelpLong | ArgAction::Version
    )
}

fn is_multi(arg: &Arg) -> bool {
    matches!(arg.get_action(), ArgAction::Append)
        || arg.get_num_args().is_some_and(|range| range.max_values() > 1)
}

fn value_type_of(arg: &Arg) -> &'static str {
    match arg.get_action() {
        ArgAction::SetTrue | ArgAction::SetFalse => return "bool",
        ArgAction::Count => return "count",
        _ => {}
    }

    let parsed = arg.get_value_parser().type_id();
    let (scalar, list) = [
        (TypeId::of::<bool>(), "bool", "boolSlice"),
        (TypeId::of::<i8>(), "int8", "int8Slice"),
        (TypeId::of::<i16>(), "int16", "int16Slice"),
        (TypeId::of::<i32>(), "int32", "int32Slice"),
        (TypeId::of::<i64>(), "int64", "int64Slice"),
        (TypeId::of::<isize>(), "int", "intSlice"),
        (TypeId::of::<u8>(), "uint8", "uint8Slice"),
        (TypeId::of::<u16>(), "uint16", "uint16Slice"),
        (TypeId::of::<u32>(), "uint32", "uint32Slice"),
        (TypeId::of::<u64>(), "uint64", "uint64Slice"),
        (TypeId::of::<usize>(), "uint", "uintSlice"),
        (TypeId::of::<f32>(), "float32", "float32Slice"),
        (TypeId::of::<f64>(), "float64", "float64Slice"),
        (TypeId::of::<PathBuf>(), "string", "stringSlice"),
        (TypeId::of::<OsString>(), "string", "stringSlice"),
    ]
    .into_iter()
    .find(|(ty, _, _)| parsed == *ty)
    .map(|(_, scalar, list)| (scalar, list))
    .unwrap_or(("string", "stringSlice"));

    if is_multi(arg) { list } else { scalar }
}

/// Render values as a bracketed CSV record: `[a,b,"c,d"]`.
fn render_list(values: &[Cow<'_, str>]) -> String {
    let fields: Vec<Cow<'_, str>> = values.iter().map(|v| csv_field(v)).collect();
    format!("[{}]", fields.join(","))
}

fn csv_field(value: &str) -> Cow<'_, str> {
    let needs_quotes =
        value.is_empty() || value.starts_with(' ') || value.contains([',', '"', '\r', '\n']);
    if needs_quotes {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
