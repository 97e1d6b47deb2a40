//! Test task
//!
//! Runs the test runner with the App Engine plugin pointed at the SDK. Tests run
//! outside the sandbox unless the `with-sandbox` flag is given.

use crate::error::{ExecutionError, FabengineError};
use crate::runner::{execute_command, Context, Task, TaskArgs};

/// Flag that keeps the sandbox enabled; consumed, never forwarded
const WITH_SANDBOX: &str = "with-sandbox";

pub fn task() -> Task {
    Task::new("test", |args, ctx| {
        let argv = test_command(args, ctx);
        execute_command(&argv, ctx).map_err(|e| match e {
            ExecutionError::CommandFailed {
                code: Some(code), ..
            } => FabengineError::from(ExecutionError::TestsFailed(code)),
            other => other.into(),
        })
    })
    .with_usage("Run the test suite")
}

/// Build the test runner command line
pub fn test_command(args: &TaskArgs, ctx: &Context) -> Vec<String> {
    let mut forwarded = args.clone();
    if !forwarded.flags.remove(WITH_SANDBOX) {
        forwarded.flags.insert("without-sandbox".to_string());
    }

    let mut argv = vec![
        ctx.config.test_runner.clone(),
        "--with-gae".to_string(),
        format!("--gae-lib-root={}", ctx.config.sdk_path.display()),
    ];
    argv.extend(forwarded.to_cmd_params());
    argv.push(ctx.root().display().to_string());
    argv
}
