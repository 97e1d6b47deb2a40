//! Common test utilities
#![allow(dead_code)]

use fabengine::config::{configure, Configuration, ConfigureOptions};
use fabengine::error::{BundleError, ExecutionError, ExecutionResult, Result};
use fabengine::runner::{CommandRunner, Context, Task, TaskArgs};
use fabengine::tasks::{Archiver, ContainerKind, PackageResolver, Requirement};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Configuration for a project in `root` with a fake SDK
pub fn test_config(root: &Path) -> Configuration {
    let options = ConfigureOptions {
        sdk_path: Some(PathBuf::from("/opt/google_appengine")),
        ..Default::default()
    };
    configure(root, options).unwrap()
}

/// A recorded command and the directory it ran in
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub argv: Vec<String>,
    pub cwd: PathBuf,
}

/// Records commands instead of running them
#[derive(Default)]
pub struct RecordingRunner {
    pub invocations: Mutex<Vec<Invocation>>,
    /// Exit code returned for commands whose program ends with this suffix
    pub fail: Mutex<Option<(String, i32)>>,
}

impl RecordingRunner {
    pub fn failing(program_suffix: &str, code: i32) -> Self {
        let runner = RecordingRunner::default();
        *runner.fail.lock().unwrap() = Some((program_suffix.to_string(), code));
        runner
    }

    pub fn commands(&self) -> Vec<Vec<String>> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.argv.clone())
            .collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, argv: &[String], cwd: &Path) -> ExecutionResult<()> {
        self.invocations.lock().unwrap().push(Invocation {
            argv: argv.to_vec(),
            cwd: cwd.to_path_buf(),
        });
        if let Some((suffix, code)) = self.fail.lock().unwrap().as_ref() {
            if argv.first().is_some_and(|p| p.ends_with(suffix.as_str())) {
                return Err(ExecutionError::CommandFailed {
                    command: argv.join(" "),
                    code: Some(*code),
                });
            }
        }
        Ok(())
    }
}

/// A scratch project and a context whose commands are recorded
pub fn recording_context() -> (TempDir, Context, Arc<RecordingRunner>) {
    recording_context_with(RecordingRunner::default())
}

pub fn recording_context_with(runner: RecordingRunner) -> (TempDir, Context, Arc<RecordingRunner>) {
    let project = TempDir::new().unwrap();
    let runner = Arc::new(runner);
    let ctx = Context::new(test_config(project.path())).with_runner(runner.clone());
    (project, ctx, runner)
}

/// Shared log of task calls
pub type CallLog = Arc<Mutex<Vec<(String, TaskArgs)>>>;

/// A task that records its effective arguments, optionally failing
pub fn logging_task(name: &str, log: &CallLog, fail: bool) -> Task {
    let log = log.clone();
    let task_name = name.to_string();
    Task::new(name, move |args, _ctx| {
        log.lock().unwrap().push((task_name.clone(), args.clone()));
        if fail {
            return Err(ExecutionError::CommandFailed {
                command: task_name.clone(),
                code: Some(1),
            }
            .into());
        }
        Ok(())
    })
}

/// Names of the logged calls, in order
pub fn call_names(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
}

/// Resolver that writes fixed artifact files into the output directory
#[derive(Default)]
pub struct FakeResolver {
    pub artifacts: Vec<String>,
    pub fail: bool,
    /// Output directories seen, to check staging cleanup
    pub staging_dirs: Mutex<Vec<PathBuf>>,
}

impl FakeResolver {
    pub fn new(artifacts: &[&str]) -> Self {
        FakeResolver {
            artifacts: artifacts.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn staging_dirs(&self) -> Vec<PathBuf> {
        self.staging_dirs.lock().unwrap().clone()
    }
}

impl PackageResolver for FakeResolver {
    fn resolve(
        &self,
        _requirement: &Requirement,
        output_dir: &Path,
        _cache_dir: Option<&Path>,
        _ctx: &Context,
    ) -> Result<Vec<PathBuf>> {
        self.staging_dirs.lock().unwrap().push(output_dir.to_path_buf());
        assert!(output_dir.is_dir(), "staging directory must exist during resolution");

        if self.fail {
            return Err(BundleError::Resolution("no matching distribution".to_string()).into());
        }

        let mut produced = Vec::new();
        for name in &self.artifacts {
            let path = output_dir.join(name);
            fs::write(&path, format!("contents of {}", name)).unwrap();
            produced.push(path);
        }
        Ok(produced)
    }
}

/// Archiver that fakes extraction with a marker file and records packing
#[derive(Default)]
pub struct FakeArchiver {
    /// Fail when unpacking a container whose name contains this
    pub fail_on: Option<String>,
    pub packed: Mutex<Vec<(Vec<PathBuf>, PathBuf)>>,
}

impl Archiver for FakeArchiver {
    fn unpack(&self, _kind: ContainerKind, container: &Path, dest: &Path, _ctx: &Context) -> Result<()> {
        let name = container.file_name().unwrap().to_string_lossy().into_owned();
        if self.fail_on.as_deref().is_some_and(|f| name.contains(f)) {
            return Err(BundleError::Archive {
                path: container.to_path_buf(),
                error: "corrupt archive".to_string(),
            }
            .into());
        }
        fs::create_dir_all(dest).unwrap();
        fs::write(dest.join("__init__.py"), fs::read(container).unwrap()).unwrap();
        Ok(())
    }

    fn pack(&self, sources: &[PathBuf], archive: &Path, _ctx: &mut Context) -> Result<()> {
        fs::write(archive, "zip").unwrap();
        self.packed
            .lock()
            .unwrap()
            .push((sources.to_vec(), archive.to_path_buf()));
        Ok(())
    }
}
