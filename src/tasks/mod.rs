//! Built-in tasks
//!
//! Every task Fabengine ships with, registered by [`builtin`].

pub mod appcfg;
pub mod bundle;
pub mod dev_appserver;
pub mod show_config;
pub mod test_runner;
pub mod virtualenv;

use crate::runner::TaskRegistry;

pub use bundle::{
    Archiver, BundleOptions, BundleReport, ContainerKind, PackageBundler, PackageResolver,
    PipResolver, Requirement, ShellArchiver,
};

/// A registry holding every built-in task
pub fn builtin() -> TaskRegistry {
    let mut registry = TaskRegistry::new();

    registry.register(show_config::task());
    registry.register(PackageBundler::default().task());
    registry.register(dev_appserver::task());
    registry.register(test_runner::task());
    registry.register(virtualenv::task());
    for command in appcfg::DEPLOY_COMMANDS {
        registry.register(appcfg::task(*command));
    }

    registry
}
