//! Execution context for task running
//!
//! The context tracks all the state needed during task execution.

use crate::config::Configuration;
use crate::runner::{CommandRunner, SystemRunner};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Execution context that tracks state during task execution
pub struct Context {
    /// Project configuration, read-only once built
    pub config: Arc<Configuration>,

    /// Directory external commands run in
    pub working_dir: PathBuf,

    /// Runs external programs
    pub runner: Arc<dyn CommandRunner>,

    /// Stack of tasks being executed (for detecting recursion)
    pub task_stack: Vec<String>,

    /// Verbosity level
    pub verbosity: Verbosity,
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Context {
    /// Create a context for a configuration, starting in the project root
    pub fn new(config: Configuration) -> Self {
        Context {
            working_dir: config.root.clone(),
            config: Arc::new(config),
            runner: Arc::new(SystemRunner),
            task_stack: Vec::new(),
            verbosity: Verbosity::Normal,
        }
    }

    /// Create a context with a specific working directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    /// Replace the command runner
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Project root
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Run `f` with the working directory set to `dir`, restoring it afterwards
    pub fn in_dir<T>(&mut self, dir: PathBuf, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.working_dir, dir);
        let result = f(self);
        self.working_dir = previous;
        result
    }

    /// Push a task onto the execution stack
    pub fn push_task(&mut self, task_name: String) {
        self.task_stack.push(task_name);
    }

    /// Pop a task from the execution stack
    pub fn pop_task(&mut self) -> Option<String> {
        self.task_stack.pop()
    }

    /// Check if a task is in the execution stack (detect recursion)
    pub fn is_task_in_stack(&self, task_name: &str) -> bool {
        self.task_stack.iter().any(|t| t == task_name)
    }

    /// Get the current task name (top of stack)
    pub fn current_task(&self) -> Option<&String> {
        self.task_stack.last()
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}", "[INFO]".green(), message);
        }
    }

    /// Print debug message (only in verbose mode)
    pub fn print_debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            eprintln!("{} {}", "[DEBUG]".dimmed(), message);
        }
    }

    /// Print a command about to run
    pub fn print_command(&self, argv: &[String]) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}", "[RUN]".cyan(), argv.join(" "));
        }
    }

    /// Print task start message
    pub fn print_task_start(&self, task_name: &str) {
        self.print_info(&format!("Running task: {}", task_name));
    }

    /// Print task complete message
    pub fn print_task_complete(&self, task_name: &str) {
        self.print_debug(&format!("Task completed: {}", task_name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{configure, ConfigureOptions};

    fn context() -> Context {
        let options = ConfigureOptions {
            sdk_path: Some(PathBuf::from("/opt/gae")),
            ..Default::default()
        };
        Context::new(configure("/srv/app", options).unwrap())
    }

    #[test]
    fn test_context_new() {
        let ctx = context();
        assert_eq!(ctx.verbosity, Verbosity::Normal);
        assert_eq!(ctx.working_dir, PathBuf::from("/srv/app"));
        assert!(ctx.task_stack.is_empty());
    }

    #[test]
    fn test_in_dir_restores() {
        let mut ctx = context().with_working_dir(PathBuf::from("/tmp"));
        let seen = ctx.in_dir(PathBuf::from("/srv/app/handlers"), |ctx| ctx.working_dir.clone());

        assert_eq!(seen, PathBuf::from("/srv/app/handlers"));
        assert_eq!(ctx.working_dir, PathBuf::from("/tmp"));
    }

    #[test]
    fn test_task_stack() {
        let mut ctx = context();

        assert!(!ctx.is_task_in_stack("update"));

        ctx.push_task("update".to_string());
        assert!(ctx.is_task_in_stack("update"));
        assert_eq!(ctx.current_task(), Some(&"update".to_string()));

        ctx.push_task("test".to_string());
        assert_eq!(ctx.current_task(), Some(&"test".to_string()));

        let popped = ctx.pop_task();
        assert_eq!(popped, Some("test".to_string()));
        assert!(!ctx.is_task_in_stack("test"));
        assert_eq!(ctx.current_task(), Some(&"update".to_string()));
    }

    #[test]
    fn test_verbosity_levels() {
        assert!(Verbosity::Verbose > Verbosity::Normal);
        assert!(Verbosity::Normal > Verbosity::Quiet);
        assert!(Verbosity::Quiet > Verbosity::Silent);
    }

    #[test]
    fn test_with_verbosity() {
        let ctx = context().with_verbosity(Verbosity::Verbose);
        assert_eq!(ctx.verbosity, Verbosity::Verbose);
    }
}
