//! Task arguments and flag serialization
//!
//! Task arguments come in two shapes: bare flags (`verbose`) and keyed options
//! (`version=2`). Both are turned into command line tokens by [`serialize`].

use std::collections::{BTreeMap, BTreeSet};

/// Default joiner between an option name and its value
pub const DEFAULT_JOINER: &str = "=";

/// Arguments passed to a task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskArgs {
    /// Bare flags; duplicates collapse
    pub flags: BTreeSet<String>,

    /// Keyed options
    pub options: BTreeMap<String, String>,
}

impl TaskArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flag
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.flags.insert(name.into());
        self
    }

    /// Add or replace an option
    pub fn option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// No flags and no options
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.options.is_empty()
    }

    /// Merge call-time arguments over these defaults
    ///
    /// Flags are unioned. Options from `call` replace defaults with the same key.
    pub fn merged(&self, call: &TaskArgs) -> TaskArgs {
        let mut merged = self.clone();
        merged.flags.extend(call.flags.iter().cloned());
        merged
            .options
            .extend(call.options.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Get an option value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    /// Whether a switch is on, given either as a flag or as a truthy option
    pub fn enabled(&self, name: &str) -> bool {
        self.flags.contains(name) || self.get(name).is_some_and(is_truthy)
    }

    /// Parse command line words: `key=value` becomes an option, anything else a flag
    ///
    /// Leading dashes are stripped so `--port=8080` and `port=8080` are equivalent.
    pub fn parse<I, S>(words: I) -> TaskArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = TaskArgs::new();
        for word in words {
            let word = word.as_ref().trim_start_matches('-');
            if word.is_empty() {
                continue;
            }
            match word.split_once('=') {
                Some((key, value)) => {
                    args.options.insert(key.to_string(), value.to_string());
                }
                None => {
                    args.flags.insert(word.to_string());
                }
            }
        }
        args
    }
}

/// Whether an option value reads as "on"
pub fn is_truthy(value: &str) -> bool {
    matches!(value, "true" | "True" | "TRUE" | "1" | "yes" | "on")
}

/// Prefix for a flag name: one dash for single characters, two otherwise
fn prefixed(name: &str) -> String {
    if name.chars().count() == 1 {
        format!("-{}", name)
    } else {
        format!("--{}", name)
    }
}

/// Serialize flags and options into command line tokens
///
/// Flags come first, then `name<joiner>value` pairs. Values are not quoted or
/// escaped; callers pass simple trusted scalars.
pub fn serialize(
    flags: &BTreeSet<String>,
    options: &BTreeMap<String, String>,
    joiner: &str,
) -> Vec<String> {
    flags
        .iter()
        .map(|flag| prefixed(flag))
        .chain(
            options
                .iter()
                .map(|(key, value)| format!("{}{}{}", prefixed(key), joiner, value)),
        )
        .collect()
}

impl TaskArgs {
    /// Serialize with the default joiner
    pub fn to_cmd_params(&self) -> Vec<String> {
        serialize(&self.flags, &self.options, DEFAULT_JOINER)
    }
}
