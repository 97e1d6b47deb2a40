//! Task execution engine
//!
//! This module handles task invocation: argument merging, hook composition,
//! working-directory scoping and running external commands.

pub mod command;
pub mod context;
pub mod hooks;
pub mod interpolate;
pub mod params;
pub mod registry;
pub mod scope;
pub mod task;

// Re-export main types
pub use command::*;
pub use context::*;
pub use hooks::*;
pub use interpolate::*;
pub use params::*;
pub use registry::*;
pub use scope::*;
pub use task::*;
