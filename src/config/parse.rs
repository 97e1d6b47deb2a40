//! Project file parsing and discovery

use crate::config::settings::ConfigureOptions;
use crate::config::types::ProjectFile;
use crate::error::{ConfigError, ConfigResult, FabengineError};
use std::fs;
use std::path::{Path, PathBuf};

/// Project file names to search for
const PROJECT_FILE_NAMES: &[&str] = &["fabengine.yml", "fabengine.yaml"];

/// Find the project file by searching the given directory and its parents
pub fn find_project_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in PROJECT_FILE_NAMES {
            let path = current_dir.join(file_name);
            searched_paths.push(path.display().to_string());

            if path.is_file() {
                return Ok(path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Parse a project file from a path
pub fn parse_project_file(path: &Path) -> Result<ProjectFile, FabengineError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read {}: {}", path.display(), e)))?;

    parse_project(&contents)
}

/// Parse a project file from a string
pub fn parse_project(yaml: &str) -> Result<ProjectFile, FabengineError> {
    // An empty file is a valid project with every default
    if yaml.trim().is_empty() {
        return Ok(ProjectFile::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

impl ProjectFile {
    /// Project root, resolved against the directory holding the file
    pub fn root_from(&self, base_dir: &Path) -> PathBuf {
        match &self.root {
            Some(root) => base_dir.join(root),
            None => base_dir.to_path_buf(),
        }
    }

    /// Options for `configure`, with relative tool paths resolved against `base_dir`
    pub fn configure_options(&self, base_dir: &Path) -> ConfigureOptions {
        let resolve = |p: &Option<String>| p.as_ref().map(|p| base_dir.join(p));

        ConfigureOptions {
            modules: self.modules.iter().map(PathBuf::from).collect(),
            sdk_path: resolve(&self.sdk_path),
            dev_appserver: resolve(&self.dev_appserver),
            appcfg: resolve(&self.appcfg),
            test_runner: self.test_runner.clone(),
        }
    }
}
