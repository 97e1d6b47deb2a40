//! Error types for Fabengine

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Fabengine operations
pub type Result<T> = std::result::Result<T, FabengineError>;

/// Main error type for Fabengine
#[derive(Error, Debug)]
pub enum FabengineError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task and external tool execution errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Package bundling errors
    #[error("Bundle error: {0}")]
    Bundle(#[from] BundleError),

    /// Variable interpolation errors
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl FabengineError {
    /// Process exit code to report for this error.
    ///
    /// A failed test run hands the test runner's own exit code back to the caller.
    pub fn exit_code(&self) -> i32 {
        match self {
            FabengineError::Execution(ExecutionError::TestsFailed(code)) => *code,
            _ => 1,
        }
    }
}

/// Configuration errors. Always fatal, never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("App Engine SDK not found: pass --sdk or put dev_appserver.py on PATH")]
    SdkNotFound,

    #[error("No active virtualenv (VIRTUAL_ENV is not set)")]
    NoVirtualEnv,

    #[error("No site-packages directory found under {0}")]
    SitePackagesNotFound(PathBuf),

    #[error("Task '{0}' is not defined")]
    TaskNotFound(String),

    #[error("Circular hook chain detected: {0}")]
    CircularHook(String),
}

/// Errors raised while running tasks and the external tools they wrap
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command `{command}` failed with exit code {code:?}")]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Command `{command}` could not be started: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Tests failed with exit code {0}")]
    TestsFailed(i32),

    #[error("Task '{0}' is already running (recursive hook chain)")]
    RecursiveTask(String),
}

/// Errors raised by the package bundler
#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Dependency resolution failed: {0}")]
    Resolution(String),

    #[error("Failed to process archive '{path}': {error}")]
    Archive { path: PathBuf, error: String },
}

/// Variable interpolation errors
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;
