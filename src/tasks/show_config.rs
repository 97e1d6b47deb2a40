//! Configuration display task

use crate::config::{module_name, Configuration};
use crate::runner::Task;
use colored::Colorize;

pub fn task() -> Task {
    Task::new("show_config", |_, ctx| {
        for line in config_lines(&ctx.config) {
            println!("{}", line);
        }
        Ok(())
    })
    .with_usage("Show the resolved configuration")
}

/// One `key: value` line per configuration entry, then one per module
fn config_lines(config: &Configuration) -> Vec<String> {
    let mut lines: Vec<String> = config
        .entries()
        .into_iter()
        .map(|(key, value)| format!("{}: {}", key.bold(), value))
        .collect();

    for manifest in &config.modules {
        lines.push(format!(
            "{}: {} ({})",
            "module".bold(),
            module_name(manifest),
            manifest.display()
        ));
    }
    lines
}
