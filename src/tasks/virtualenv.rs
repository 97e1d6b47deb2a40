//! Virtualenv path fix task
//!
//! Makes the active virtualenv import App Engine's bundled libraries by dropping
//! a customization module and a `.pth` file into its site-packages.

use crate::error::{ConfigError, ConfigResult, Result};
use crate::runner::Task;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Module written to site-packages; fixes sys.path on interpreter start
pub const GAE_CUSTOMISE: &str = r#"
def fix_sys_path():
    try:
        import sys, os
        from dev_appserver import fix_sys_path, DIR_PATH
        fix_sys_path()
        # must be after fix_sys_path
        # uses non-default version of webob
        webob_path = os.path.join(DIR_PATH, 'lib', 'webob_1_1_1')
        sys.path = [webob_path] + sys.path
    except ImportError:
        pass
"#;

const CUSTOMISE_FILE: &str = "gaecustomise.py";
const PTH_FILE: &str = "gae.pth";

pub fn task() -> Task {
    Task::new("fix_virtualenv_paths", |_, ctx| {
        let venv = env::var_os("VIRTUAL_ENV").ok_or(ConfigError::NoVirtualEnv)?;
        let site_packages = find_site_packages(Path::new(&venv))?;
        write_path_files(&site_packages, &ctx.config.sdk_path)?;
        ctx.print_info(&format!("Patched {}", site_packages.display()));
        Ok(())
    })
    .with_usage("Make the active virtualenv use App Engine's paths")
}

/// The `lib/python*/site-packages` directory of the newest Python in a virtualenv
pub fn find_site_packages(venv: &Path) -> ConfigResult<PathBuf> {
    let pattern = venv.join("lib").join("python*").join("site-packages");
    let pattern = pattern.to_string_lossy();

    glob::glob(&pattern)
        .map_err(|e| ConfigError::Invalid(format!("Bad site-packages pattern: {}", e)))?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_dir())
        .max_by_key(|path| python_version(path))
        .ok_or_else(|| ConfigError::SitePackagesNotFound(venv.to_path_buf()))
}

/// Numeric version of `.../pythonX.Y/site-packages`, so 3.11 sorts after 3.9
fn python_version(site_packages: &Path) -> Vec<u32> {
    site_packages
        .parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_prefix("python"))
        .map(|version| {
            version
                .split('.')
                .map(|part| part.parse::<u32>().unwrap_or(0))
                .collect()
        })
        .unwrap_or_default()
}

/// Write the customization module and the `.pth` file that loads it
pub fn write_path_files(site_packages: &Path, sdk_path: &Path) -> Result<()> {
    fs::write(site_packages.join(CUSTOMISE_FILE), GAE_CUSTOMISE)?;
    fs::write(
        site_packages.join(PTH_FILE),
        format!(
            "{}\nimport gaecustomise; gaecustomise.fix_sys_path()",
            sdk_path.display()
        ),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_site_packages_picks_last() {
        let venv = TempDir::new().unwrap();
        for version in ["python2.7", "python3.11"] {
            fs::create_dir_all(venv.path().join("lib").join(version).join("site-packages")).unwrap();
        }

        let found = find_site_packages(venv.path()).unwrap();
        assert!(found.ends_with("lib/python3.11/site-packages"));
    }

    #[test]
    fn test_find_site_packages_compares_versions_numerically() {
        let venv = TempDir::new().unwrap();
        for version in ["python3.9", "python3.11", "python3.10"] {
            fs::create_dir_all(venv.path().join("lib").join(version).join("site-packages")).unwrap();
        }

        let found = find_site_packages(venv.path()).unwrap();
        assert!(found.ends_with("lib/python3.11/site-packages"));
    }

    #[test]
    fn test_find_site_packages_missing() {
        let venv = TempDir::new().unwrap();
        assert!(matches!(
            find_site_packages(venv.path()),
            Err(ConfigError::SitePackagesNotFound(_))
        ));
    }

    #[test]
    fn test_write_path_files() {
        let site = TempDir::new().unwrap();
        write_path_files(site.path(), Path::new("/opt/gae")).unwrap();

        let customise = fs::read_to_string(site.path().join("gaecustomise.py")).unwrap();
        assert_eq!(customise, GAE_CUSTOMISE);

        let pth = fs::read_to_string(site.path().join("gae.pth")).unwrap();
        assert_eq!(pth, "/opt/gae\nimport gaecustomise; gaecustomise.fix_sys_path()");
    }
}
