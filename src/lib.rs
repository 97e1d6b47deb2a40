//! Fabengine - App Engine project tasks
//!
//! Fabengine wraps the App Engine SDK tools (dev server, deploy tool, test runner)
//! and a dependency bundler behind named tasks with default arguments and
//! before/after hooks.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod tasks;

// Re-export commonly used types
pub use error::{FabengineError, Result};

/// Current version of Fabengine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
