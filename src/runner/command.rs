//! Command construction and execution
//!
//! This module builds argument vectors for the SDK tools and runs external programs.

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{Context, TaskArgs};
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};

/// Runs external programs
///
/// Calls block until the program exits. There is no timeout.
pub trait CommandRunner: Send + Sync {
    /// Run `argv` in `cwd`, failing on a non-zero exit
    fn run(&self, argv: &[String], cwd: &Path) -> ExecutionResult<()>;
}

/// Runs programs as child processes with inherited stdio
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String], cwd: &Path) -> ExecutionResult<()> {
        let command_line = argv.join(" ");
        let Some((program, args)) = argv.split_first() else {
            return Ok(());
        };

        log::debug!("spawning `{}` in {}", command_line, cwd.display());

        let status = StdCommand::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| ExecutionError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ExecutionError::CommandFailed {
                command: command_line,
                code: status.code(),
            });
        }

        Ok(())
    }
}

/// Print and run a command in the context's working directory
pub fn execute_command(argv: &[String], ctx: &Context) -> ExecutionResult<()> {
    ctx.print_command(argv);
    ctx.runner.run(argv, &ctx.working_dir)
}

/// Build an SDK tool command line
///
/// The result is the tool, the optional subcommand, the serialized arguments and
/// finally the targets (module manifests or the project root).
pub fn build_command(
    tool: &Path,
    subcommand: Option<&str>,
    args: &TaskArgs,
    targets: &[String],
) -> Vec<String> {
    let mut argv = vec![tool.display().to_string()];
    argv.extend(subcommand.map(str::to_string));
    argv.extend(args.to_cmd_params());
    argv.extend(targets.iter().cloned());
    argv
}
