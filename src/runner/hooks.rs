//! Before/after hooks
//!
//! A hook runs another task around a task's body. Before and after hooks carry
//! the arguments given when the hook was created; the arguments of the wrapped
//! call are not forwarded to them.

use crate::error::Result;
use crate::runner::{Context, Scope, TaskArgs, TaskRegistry};
use std::fmt;
use std::sync::Arc;

/// Builds a scope for one invocation from the call-time arguments
pub type HookFactory = Arc<dyn Fn(&TaskArgs) -> Box<dyn Scope> + Send + Sync>;

/// A task invocation bound when the hook was registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookCall {
    pub task: String,
    pub args: TaskArgs,
}

/// A hook attached to a task
#[derive(Clone)]
pub enum Hook {
    /// Run a task before the body; its failure aborts the body
    Before(HookCall),

    /// Run a task after the body, only if nothing failed
    After(HookCall),

    /// Build an arbitrary scope per invocation
    Factory(HookFactory),
}

impl Hook {
    pub fn before(task: impl Into<String>, args: TaskArgs) -> Self {
        Hook::Before(HookCall {
            task: task.into(),
            args,
        })
    }

    pub fn after(task: impl Into<String>, args: TaskArgs) -> Self {
        Hook::After(HookCall {
            task: task.into(),
            args,
        })
    }

    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(&TaskArgs) -> Box<dyn Scope> + Send + Sync + 'static,
    {
        Hook::Factory(Arc::new(f))
    }

    /// Turn the hook into a scope for one invocation
    pub fn resolve(&self, call_args: &TaskArgs) -> Box<dyn Scope> {
        match self {
            Hook::Before(call) => Box::new(Before(call.clone())),
            Hook::After(call) => Box::new(After(call.clone())),
            Hook::Factory(factory) => factory(call_args),
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Before(call) => f.debug_tuple("Before").field(call).finish(),
            Hook::After(call) => f.debug_tuple("After").field(call).finish(),
            Hook::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

struct Before(HookCall);

impl Scope for Before {
    fn enter(&mut self, registry: &TaskRegistry, ctx: &mut Context) -> Result<()> {
        ctx.print_debug(&format!("Running before hook: {}", self.0.task));
        registry.invoke(&self.0.task, &self.0.args, ctx)
    }

    fn exit(&mut self, _: &TaskRegistry, _: &mut Context, _: bool) -> Result<()> {
        Ok(())
    }
}

struct After(HookCall);

impl Scope for After {
    fn enter(&mut self, _: &TaskRegistry, _: &mut Context) -> Result<()> {
        Ok(())
    }

    fn exit(&mut self, registry: &TaskRegistry, ctx: &mut Context, failed: bool) -> Result<()> {
        if failed {
            ctx.print_debug(&format!("Skipping after hook: {}", self.0.task));
            return Ok(());
        }
        ctx.print_debug(&format!("Running after hook: {}", self.0.task));
        registry.invoke(&self.0.task, &self.0.args, ctx)
    }
}
