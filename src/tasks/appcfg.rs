//! Deploy tool tasks
//!
//! Each task runs one `appcfg.py` subcommand against either the module
//! manifests or the project root.

use crate::runner::{build_command, execute_command, Task};

/// An `appcfg.py` subcommand exposed as a task
#[derive(Debug, Clone, Copy)]
pub struct DeployCommand {
    /// Task name, also the subcommand passed to the tool
    pub name: &'static str,
    pub usage: &'static str,
    /// Pass the module manifests instead of the project root
    pub uses_module_list: bool,
}

pub const DEPLOY_COMMANDS: &[DeployCommand] = &[
    DeployCommand {
        name: "update",
        usage: "Upload code to App Engine",
        uses_module_list: true,
    },
    DeployCommand {
        name: "update_indexes",
        usage: "Update datastore indexes",
        uses_module_list: false,
    },
    DeployCommand {
        name: "update_queues",
        usage: "Update task queues",
        uses_module_list: false,
    },
    DeployCommand {
        name: "vacuum_indexes",
        usage: "Delete unused datastore indexes",
        uses_module_list: false,
    },
    DeployCommand {
        name: "update_dos",
        usage: "Update DoS protection",
        uses_module_list: false,
    },
    DeployCommand {
        name: "update_cron",
        usage: "Update cron jobs",
        uses_module_list: false,
    },
    DeployCommand {
        name: "update_dispatch",
        usage: "Update the dispatch rules",
        uses_module_list: false,
    },
    DeployCommand {
        name: "delete_version",
        usage: "Delete a version of the modules",
        uses_module_list: true,
    },
    DeployCommand {
        name: "set_default_version",
        usage: "Make a version the default for the modules",
        uses_module_list: true,
    },
];

/// Build the task for a deploy subcommand
pub fn task(command: DeployCommand) -> Task {
    Task::new(command.name, move |args, ctx| {
        let targets = if command.uses_module_list {
            ctx.config.module_args()
        } else {
            vec![ctx.root().display().to_string()]
        };
        let argv = build_command(&ctx.config.appcfg, Some(command.name), args, &targets);
        execute_command(&argv, ctx)?;
        Ok(())
    })
    .with_usage(command.usage)
}
