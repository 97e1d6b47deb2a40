//! Development server task

use crate::runner::{build_command, execute_command, Task};

/// Runs the dev server on every module manifest
///
/// All arguments are forwarded, e.g. `port=8080 clear_datastore`.
pub fn task() -> Task {
    Task::new("dev_appserver", |args, ctx| {
        let argv = build_command(&ctx.config.dev_appserver, None, args, &ctx.config.module_args());
        execute_command(&argv, ctx)?;
        Ok(())
    })
    .with_usage("Run the development server")
}
