//! Main CLI application

use crate::config::{
    configure, current_dir, find_project_file_from, parse_project_file, Configuration,
    ProjectFile,
};
use crate::error::{ConfigError, FabengineError};
use crate::runner::{Context, TaskArgs, TaskRegistry, Verbosity};
use crate::tasks;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// CLI application
pub struct App {
    /// The clap command
    command: Command,
    /// Tasks that can be invoked
    registry: TaskRegistry,
}

impl App {
    /// Create an app exposing the built-in tasks
    pub fn new() -> Self {
        Self::with_registry(tasks::builtin())
    }

    /// Create an app exposing the tasks of a registry
    pub fn with_registry(registry: TaskRegistry) -> Self {
        App {
            command: build_command(&registry),
            registry,
        }
    }

    /// Run the application with the process arguments
    pub fn run(self) -> Result<(), FabengineError> {
        self.run_from(std::env::args_os())
    }

    /// Run the application with explicit arguments
    pub fn run_from<I, T>(mut self, args: I) -> Result<(), FabengineError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command.clone().get_matches_from(args);

        let verbosity = get_verbosity(&matches);
        init_logging(verbosity);

        let (task_name, task_matches) = match matches.subcommand() {
            Some(("completions", sub)) => {
                if let Some(shell) = sub.get_one::<Shell>("shell") {
                    let name = self.command.get_name().to_string();
                    clap_complete::generate(*shell, &mut self.command, name, &mut io::stdout());
                }
                return Ok(());
            }
            Some((name, sub_matches)) => (name.to_string(), sub_matches),
            None => {
                // No task specified, show help
                self.command.print_help()?;
                println!();
                return Ok(());
            }
        };

        let (config, project) = load_configuration(&matches)?;
        self.registry.apply_project(&project, &config)?;

        let args = TaskArgs::parse(
            task_matches
                .get_many::<String>("args")
                .into_iter()
                .flatten(),
        );

        let mut ctx = Context::new(config).with_verbosity(verbosity);
        self.registry.invoke(&task_name, &args, &mut ctx)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the clap command from the registered tasks
fn build_command(registry: &TaskRegistry) -> Command {
    let mut cmd = Command::new("fabengine")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tasks for App Engine projects")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Path to fabengine.yml project file")
                .global(true),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Project root (defaults to the project file's directory)")
                .global(true),
        )
        .arg(
            Arg::new("sdk")
                .long("sdk")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("App Engine SDK directory")
                .global(true),
        )
        .arg(
            Arg::new("module")
                .short('m')
                .long("module")
                .value_name("MANIFEST")
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Append)
                .help("Module manifest, may be repeated")
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print command output and errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        );

    // Add subcommands for each task
    for task in registry.tasks() {
        let task_cmd = Command::new(task.name.clone())
            .about(task.usage.clone().unwrap_or_default())
            .arg(
                Arg::new("args")
                    .value_name("ARGS")
                    .help("Flags and key=value options passed to the task")
                    .num_args(0..)
                    .trailing_var_arg(true)
                    .allow_hyphen_values(true),
            );
        cmd = cmd.subcommand(task_cmd);
    }

    cmd.subcommand(
        Command::new("completions")
            .about("Print a shell completion script")
            .arg(
                Arg::new("shell")
                    .value_name("SHELL")
                    .required(true)
                    .value_parser(value_parser!(Shell)),
            ),
    )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Route `log` output through env_logger; `RUST_LOG` wins over the verbosity flags
fn init_logging(verbosity: Verbosity) {
    let level = match verbosity {
        Verbosity::Silent => "off",
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init();
}

/// Find and parse the project file, if any
fn load_project(matches: &ArgMatches) -> Result<(ProjectFile, PathBuf), FabengineError> {
    if let Some(path) = matches.get_one::<PathBuf>("file") {
        let base = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        // Settings in the file resolve against its directory, not the cwd
        let base = std::path::absolute(&base)?;
        return Ok((parse_project_file(path)?, base));
    }

    let cwd = current_dir()?;
    match find_project_file_from(cwd.clone()) {
        Ok(path) => {
            let base = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
            Ok((parse_project_file(&path)?, base))
        }
        // No project file: every setting takes its default
        Err(ConfigError::NotFound(_)) => Ok((ProjectFile::default(), cwd)),
        Err(e) => Err(e.into()),
    }
}

/// Build the configuration from the project file and command line overrides
fn load_configuration(
    matches: &ArgMatches,
) -> Result<(Configuration, ProjectFile), FabengineError> {
    let (project, base) = load_project(matches)?;

    let root = match matches.get_one::<PathBuf>("root") {
        Some(root) => root.clone(),
        None => project.root_from(&base),
    };

    let mut options = project.configure_options(&base);
    if let Some(sdk) = matches.get_one::<PathBuf>("sdk") {
        options.sdk_path = Some(sdk.clone());
    }
    if let Some(modules) = matches.get_many::<PathBuf>("module") {
        options.modules = modules.cloned().collect();
    }

    Ok((configure(root, options)?, project))
}

/// Run the CLI application
pub fn run() -> Result<(), FabengineError> {
    App::new().run()
}
