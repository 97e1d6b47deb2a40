//! Task registry and invocation
//!
//! The registry owns every task by name and is the only way tasks are run, so
//! hooks can look up the tasks they wrap.

use crate::config::{validate_project, Configuration, HookSettings, ProjectFile};
use crate::error::{ConfigError, ExecutionError, Result};
use crate::runner::{interpolate_args, run_scoped, Context, Hook, Task, TaskArgs};
use std::collections::BTreeMap;

/// Registered tasks, by name
#[derive(Debug, Default, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task, replacing any task with the same name
    pub fn register(&mut self, task: Task) {
        self.tasks.insert(task.name.clone(), task);
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// Registered tasks in name order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tasks.keys().map(String::as_str).collect()
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Task> {
        self.tasks
            .get_mut(name)
            .ok_or_else(|| ConfigError::TaskNotFound(name.to_string()).into())
    }

    /// Attach a hook to a registered task
    pub fn add_hook(&mut self, name: &str, hook: Hook) -> Result<()> {
        self.get_mut(name)?.hooks.push(hook);
        Ok(())
    }

    /// Merge extra defaults into a registered task's defaults
    pub fn add_defaults(&mut self, name: &str, defaults: &TaskArgs) -> Result<()> {
        let task = self.get_mut(name)?;
        task.defaults = task.defaults.merged(defaults);
        Ok(())
    }

    /// Apply the defaults and hooks declared in a project file
    pub fn apply_project(&mut self, project: &ProjectFile, config: &Configuration) -> Result<()> {
        validate_project(project, &self.names())?;
        let vars = config.vars();

        let mut names: Vec<&String> = project.tasks.keys().collect();
        names.sort();

        for name in names {
            let settings = &project.tasks[name];
            let defaults = TaskArgs {
                flags: settings.flags.iter().cloned().collect(),
                options: settings.options.clone(),
            };
            self.add_defaults(name, &interpolate_args(&defaults, &vars)?)?;

            for hook in &settings.before {
                let (task, args) = hook_call(hook, &vars)?;
                self.add_hook(name, Hook::before(task, args))?;
            }
            for hook in &settings.after {
                let (task, args) = hook_call(hook, &vars)?;
                self.add_hook(name, Hook::after(task, args))?;
            }
        }

        Ok(())
    }

    /// Invoke a task by name
    ///
    /// Runs with the working directory set to the project root, defaults merged
    /// under `args`, and the task's hooks wrapped around the body. The working
    /// directory is restored whether or not the task succeeds.
    pub fn invoke(&self, name: &str, args: &TaskArgs, ctx: &mut Context) -> Result<()> {
        let task = self
            .get(name)
            .ok_or_else(|| ConfigError::TaskNotFound(name.to_string()))?;

        if ctx.is_task_in_stack(name) {
            return Err(ExecutionError::RecursiveTask(name.to_string()).into());
        }

        ctx.print_task_start(name);
        ctx.push_task(name.to_string());

        let root = ctx.root().to_path_buf();
        let result = ctx.in_dir(root, |ctx| {
            let effective = task.defaults.merged(args);
            if !effective.is_empty() {
                ctx.print_debug(&format!(
                    "Arguments: {}",
                    effective.to_cmd_params().join(" ")
                ));
            }
            let scopes = task.hooks.iter().map(|hook| hook.resolve(args)).collect();
            run_scoped(scopes, self, ctx, |ctx| task.call_body(&effective, ctx))
        });

        ctx.pop_task();

        match &result {
            Ok(()) => ctx.print_task_complete(name),
            Err(e) => ctx.print_debug(&format!("Task '{}' failed: {}", name, e)),
        }

        result
    }
}

fn hook_call(
    hook: &HookSettings,
    vars: &std::collections::HashMap<String, String>,
) -> Result<(String, TaskArgs)> {
    let args = match hook {
        HookSettings::Simple(_) => TaskArgs::new(),
        HookSettings::Complex(detail) => interpolate_args(
            &TaskArgs {
                flags: detail.flags.iter().cloned().collect(),
                options: detail.options.clone(),
            },
            vars,
        )?,
    };
    Ok((hook.task().to_string(), args))
}
