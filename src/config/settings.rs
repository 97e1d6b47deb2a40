//! Process-wide configuration
//!
//! A `Configuration` is built once by [`configure`] before any task runs and is
//! only read afterwards. Tasks reach it through the execution context.

use crate::error::{ConfigError, ConfigResult};
use serde_yaml::Value;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Dev server script shipped with the SDK
pub const DEV_APPSERVER: &str = "dev_appserver.py";

/// Deploy tool script shipped with the SDK
pub const APPCFG: &str = "appcfg.py";

/// Test runner used when none is configured
pub const DEFAULT_TEST_RUNNER: &str = "nosetests";

/// Manifest used when no modules are declared
pub const DEFAULT_MODULE: &str = "app.yaml";

/// Optional overrides accepted by [`configure`]
#[derive(Debug, Clone, Default)]
pub struct ConfigureOptions {
    /// Module/service manifests, relative to the root or absolute
    pub modules: Vec<PathBuf>,

    /// SDK directory; probed from PATH when absent
    pub sdk_path: Option<PathBuf>,

    /// Dev server tool; defaults to `<sdk>/dev_appserver.py`
    pub dev_appserver: Option<PathBuf>,

    /// Deploy tool; defaults to `<sdk>/appcfg.py`
    pub appcfg: Option<PathBuf>,

    /// Test runner program; defaults to `nosetests`
    pub test_runner: Option<String>,
}

/// Resolved configuration shared by every task
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    /// Absolute path of the project being operated on
    pub root: PathBuf,

    /// Absolute path of the App Engine SDK
    pub sdk_path: PathBuf,

    /// Dev server tool path
    pub dev_appserver: PathBuf,

    /// Deploy tool path
    pub appcfg: PathBuf,

    /// Test runner program
    pub test_runner: String,

    /// Module/service manifests, in declaration order
    pub modules: Vec<PathBuf>,
}

/// Build the configuration for the project at `root`
pub fn configure(root: impl AsRef<Path>, options: ConfigureOptions) -> ConfigResult<Configuration> {
    let root = absolute(root.as_ref())?;

    let sdk_path = match options.sdk_path {
        Some(path) => absolute(&path)?,
        None => find_appengine()?,
    };

    let modules = if options.modules.is_empty() {
        vec![root.join(DEFAULT_MODULE)]
    } else {
        options.modules.iter().map(|m| root.join(m)).collect()
    };

    let dev_appserver = match options.dev_appserver {
        Some(path) => absolute(&path)?,
        None => sdk_path.join(DEV_APPSERVER),
    };
    let appcfg = match options.appcfg {
        Some(path) => absolute(&path)?,
        None => sdk_path.join(APPCFG),
    };

    Ok(Configuration {
        dev_appserver,
        appcfg,
        test_runner: options
            .test_runner
            .unwrap_or_else(|| DEFAULT_TEST_RUNNER.to_string()),
        root,
        sdk_path,
        modules,
    })
}

/// Locate the SDK through the dev server script on PATH
///
/// Symlinks are followed so that a linked script resolves to the real SDK directory.
pub fn find_appengine() -> ConfigResult<PathBuf> {
    let script = which::which(DEV_APPSERVER).map_err(|_| ConfigError::SdkNotFound)?;
    let script = fs::canonicalize(&script).unwrap_or(script);
    script
        .parent()
        .map(Path::to_path_buf)
        .ok_or(ConfigError::SdkNotFound)
}

fn absolute(path: &Path) -> ConfigResult<PathBuf> {
    std::path::absolute(path).map_err(|e| {
        ConfigError::Invalid(format!("Cannot resolve path '{}': {}", path.display(), e))
    })
}

impl Configuration {
    /// Key/value pairs in display order
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("root", self.root.display().to_string()),
            ("sdk_path", self.sdk_path.display().to_string()),
            ("dev_appserver", self.dev_appserver.display().to_string()),
            ("appcfg", self.appcfg.display().to_string()),
            ("test_runner", self.test_runner.clone()),
            (
                "modules",
                self.modules
                    .iter()
                    .map(|m| m.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        ]
    }

    /// Variables available to `${...}` references in the project file
    pub fn vars(&self) -> HashMap<String, String> {
        self.entries()
            .into_iter()
            .filter(|(key, _)| *key != "modules")
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }

    /// Module manifest paths as command line arguments
    pub fn module_args(&self) -> Vec<String> {
        self.modules
            .iter()
            .map(|m| m.display().to_string())
            .collect()
    }
}

/// Read the module name declared by a manifest
///
/// Looks at the `module` key, then `service`. Unreadable manifests and manifests
/// without either key belong to the `default` module.
pub fn module_name(manifest: &Path) -> String {
    fs::read_to_string(manifest)
        .ok()
        .and_then(|contents| serde_yaml::from_str::<Value>(&contents).ok())
        .and_then(|doc| {
            ["module", "service"]
                .iter()
                .find_map(|key| doc.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| "default".to_string())
}

/// Current directory, for callers that need an anchor before configuring
pub fn current_dir() -> ConfigResult<PathBuf> {
    env::current_dir()
        .map_err(|e| ConfigError::Invalid(format!("Failed to get current directory: {}", e)))
}
