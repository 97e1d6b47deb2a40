//! Variable interpolation for configured task arguments
//!
//! Values in fabengine.yml may reference configuration entries and environment
//! variables using the `${var}` syntax.

use crate::error::{InterpolationError, InterpolationResult};
use crate::runner::TaskArgs;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::env;
use std::sync::OnceLock;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("interpolation pattern is valid"))
}

/// Interpolate variables in a string
///
/// Looks in `vars` first, then the environment. Undefined variables are an error.
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> InterpolationResult<String> {
    let mut missing = None;

    let result = pattern().replace_all(s, |caps: &Captures| {
        let name = &caps[1];
        if let Some(value) = vars.get(name) {
            return value.clone();
        }
        if let Ok(value) = env::var(name) {
            return value;
        }
        missing.get_or_insert_with(|| name.to_string());
        String::new()
    });

    match missing {
        Some(name) => Err(InterpolationError::UndefinedVariable(name)),
        None => Ok(result.into_owned()),
    }
}

/// Interpolate every flag and option value of a set of task arguments
pub fn interpolate_args(
    args: &TaskArgs,
    vars: &HashMap<String, String>,
) -> InterpolationResult<TaskArgs> {
    let mut result = TaskArgs::new();

    for flag in &args.flags {
        result.flags.insert(interpolate(flag, vars)?);
    }
    for (key, value) in &args.options {
        result.options.insert(key.clone(), interpolate(value, vars)?);
    }

    Ok(result)
}
