//! Scoped resources wrapped around a task body
//!
//! Scopes are entered in order and exited in reverse order. Exits always run for
//! every scope that was entered, even when a later scope or the body fails.

use crate::error::Result;
use crate::runner::{Context, TaskRegistry};

/// A resource entered before a task body and exited after it
pub trait Scope {
    /// Called before the body. A failure here skips the body.
    fn enter(&mut self, registry: &TaskRegistry, ctx: &mut Context) -> Result<()>;

    /// Called after the body, with `failed` set when anything inside the scope failed
    fn exit(&mut self, registry: &TaskRegistry, ctx: &mut Context, failed: bool) -> Result<()>;
}

/// Run `body` inside the given scopes
///
/// The first failure wins: it is returned once every entered scope has exited.
pub fn run_scoped<T>(
    scopes: Vec<Box<dyn Scope>>,
    registry: &TaskRegistry,
    ctx: &mut Context,
    body: impl FnOnce(&mut Context) -> Result<T>,
) -> Result<T> {
    let mut entered: Vec<Box<dyn Scope>> = Vec::with_capacity(scopes.len());
    let mut entry_failure = None;

    for mut scope in scopes {
        match scope.enter(registry, ctx) {
            Ok(()) => entered.push(scope),
            Err(e) => {
                entry_failure = Some(e);
                break;
            }
        }
    }

    let mut outcome = match entry_failure {
        Some(e) => Err(e),
        None => body(ctx),
    };

    for scope in entered.iter_mut().rev() {
        let failed = outcome.is_err();
        if let Err(e) = scope.exit(registry, ctx, failed) {
            if outcome.is_ok() {
                outcome = Err(e);
            } else {
                log::warn!("suppressed scope exit failure: {}", e);
            }
        }
    }

    outcome
}
