//! Task definitions
//!
//! A task is a name, default arguments, a list of hooks and a body. Built-in
//! tasks only differ in the body they carry.

use crate::error::Result;
use crate::runner::{Context, Hook, TaskArgs};
use std::fmt;
use std::sync::Arc;

/// The work a task performs with its effective arguments
pub type TaskBody = Arc<dyn Fn(&TaskArgs, &mut Context) -> Result<()> + Send + Sync>;

/// A named, reusable operation
#[derive(Clone)]
pub struct Task {
    /// Task name
    pub name: String,

    /// One-line description for help text
    pub usage: Option<String>,

    /// Arguments always passed, unless overridden at call time
    pub defaults: TaskArgs,

    /// Hooks, outermost first
    pub hooks: Vec<Hook>,

    body: TaskBody,
}

impl Task {
    /// Create a task with a body
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&TaskArgs, &mut Context) -> Result<()> + Send + Sync + 'static,
    {
        Task {
            name: name.into(),
            usage: None,
            defaults: TaskArgs::new(),
            hooks: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// Set the usage line
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    /// Set default arguments
    pub fn with_defaults(mut self, defaults: TaskArgs) -> Self {
        self.defaults = defaults;
        self
    }

    /// Append a hook
    pub fn with_hook(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }

    /// A hook that runs this task, with `args`, before another task
    pub fn run_before(&self, args: TaskArgs) -> Hook {
        Hook::before(self.name.clone(), args)
    }

    /// A hook that runs this task, with `args`, after another task succeeds
    pub fn run_after(&self, args: TaskArgs) -> Hook {
        Hook::after(self.name.clone(), args)
    }

    /// Call the body directly, without defaults or hooks
    pub(crate) fn call_body(&self, args: &TaskArgs, ctx: &mut Context) -> Result<()> {
        (self.body)(args, ctx)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("defaults", &self.defaults)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}
