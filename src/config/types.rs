//! Project file types
//!
//! This module defines the data structures that represent a fabengine.yml file.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Top-level project file structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProjectFile {
    /// Project root, relative to the file (defaults to the file's directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    /// App Engine SDK directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_path: Option<String>,

    /// Module/service manifests
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<String>,

    /// Dev server tool override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_appserver: Option<String>,

    /// Deploy tool override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appcfg: Option<String>,

    /// Test runner override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_runner: Option<String>,

    /// Per-task defaults and hooks
    #[serde(default)]
    pub tasks: HashMap<String, TaskSettings>,
}

/// Defaults and hooks for one task
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TaskSettings {
    /// Flags always passed to the task
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,

    /// Options always passed unless overridden at call time
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,

    /// Tasks to run before this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub before: Vec<HookSettings>,

    /// Tasks to run after this one succeeds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<HookSettings>,
}

/// A hook reference
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HookSettings {
    /// Simple task name
    Simple(String),

    /// Task with fixed arguments
    Complex(HookDetail),
}

/// Detailed hook specification
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HookDetail {
    /// Name of the task to run
    pub task: String,

    /// Flags passed to the hooked task
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,

    /// Options passed to the hooked task
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl HookSettings {
    /// Name of the hooked task
    pub fn task(&self) -> &str {
        match self {
            HookSettings::Simple(name) => name,
            HookSettings::Complex(detail) => &detail.task,
        }
    }
}

impl TaskSettings {
    /// Every task referenced by a hook, before-hooks first
    pub fn hook_targets(&self) -> impl Iterator<Item = &str> {
        self.before.iter().chain(self.after.iter()).map(HookSettings::task)
    }
}
