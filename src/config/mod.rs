//! Configuration
//!
//! This module builds the process-wide configuration and handles parsing and
//! validation of the optional fabengine.yml project file.

pub mod parse;
pub mod schema;
pub mod settings;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use settings::*;
pub use types::*;
