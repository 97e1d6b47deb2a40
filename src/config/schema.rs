//! Project file validation
//!
//! Checks that every configured task and hook target exists and that hook
//! chains cannot loop.

use crate::config::types::ProjectFile;
use crate::error::{ConfigError, ConfigResult};
use std::collections::HashSet;

/// Validate a project file against the set of registered task names
pub fn validate_project(project: &ProjectFile, known_tasks: &[&str]) -> ConfigResult<()> {
    let known: HashSet<&str> = known_tasks.iter().copied().collect();

    for (name, settings) in &project.tasks {
        if !known.contains(name.as_str()) {
            return Err(ConfigError::TaskNotFound(name.clone()));
        }
        for target in settings.hook_targets() {
            if !known.contains(target) {
                return Err(ConfigError::TaskNotFound(target.to_string()));
            }
        }
    }

    detect_circular_hooks(project)
}

/// Detect hook chains that would run a task from inside itself
fn detect_circular_hooks(project: &ProjectFile) -> ConfigResult<()> {
    let mut names: Vec<&String> = project.tasks.keys().collect();
    names.sort();

    let mut visited = HashSet::new();
    for name in names {
        let mut stack = Vec::new();
        check_hook_cycle(project, name, &mut visited, &mut stack)?;
    }
    Ok(())
}

/// Recursively follow hook targets looking for a cycle
fn check_hook_cycle(
    project: &ProjectFile,
    task_name: &str,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> ConfigResult<()> {
    if stack.iter().any(|t| t == task_name) {
        stack.push(task_name.to_string());
        return Err(ConfigError::CircularHook(stack.join(" -> ")));
    }

    if visited.contains(task_name) {
        return Ok(());
    }

    // Tasks without settings have no hooks
    let Some(settings) = project.tasks.get(task_name) else {
        visited.insert(task_name.to_string());
        return Ok(());
    };

    stack.push(task_name.to_string());
    for target in settings.hook_targets() {
        check_hook_cycle(project, target, visited, stack)?;
    }
    stack.pop();
    visited.insert(task_name.to_string());

    Ok(())
}
