//! Dependency bundling
//!
//! Resolves third-party requirements into the project's package directory so
//! they can be uploaded with the app. The steps are:
//!
//! 1. resolve the requirements into a fresh staging directory
//! 2. move the produced artifacts into the package directory
//! 3. unpack container artifacts (wheels, zips, tarballs) in place
//! 4. optionally pack the package directory into one store-only zip
//! 5. optionally append a loader shim to the project's startup file
//!
//! The staging directory is removed on every exit path. The package directory
//! is not transactional: a failure after step 2 leaves whatever was already
//! moved or unpacked in place.

use crate::error::{BundleError, Result};
use crate::runner::{execute_command, Context, Task, TaskArgs};
use directories::ProjectDirs;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Startup-file code that puts every bundled artifact on the import path
///
/// `{package_dir}` is replaced with the package directory, relative to the startup file.
pub const LOADER_TEMPLATE: &str = r#"
# Added by fabengine: make bundled packages importable
import os, sys
package_dir_path = os.path.join(os.path.dirname(__file__), "{package_dir}")
for filename in sorted(os.listdir(package_dir_path), key=lambda name: name.lower(), reverse=True):
    sys.path.insert(0, os.path.join(package_dir_path, filename))
"#;

/// What to resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// A requirements file
    Manifest(PathBuf),
    /// A single requirement specifier, e.g. `flask==0.10`
    Package(String),
}

/// Resolves requirements into artifact files
pub trait PackageResolver: Send + Sync {
    /// Resolve into `output_dir` and return the artifacts produced there
    fn resolve(
        &self,
        requirement: &Requirement,
        output_dir: &Path,
        cache_dir: Option<&Path>,
        ctx: &Context,
    ) -> Result<Vec<PathBuf>>;
}

/// Unpacks and packs archives
pub trait Archiver: Send + Sync {
    /// Extract `container` into the directory `dest`
    fn unpack(&self, kind: ContainerKind, container: &Path, dest: &Path, ctx: &Context) -> Result<()>;

    /// Add the contents of each source directory to a store-only zip at `archive`
    fn pack(&self, sources: &[PathBuf], archive: &Path, ctx: &mut Context) -> Result<()>;
}

/// Resolves with `pip wheel`
#[derive(Debug, Clone)]
pub struct PipResolver {
    pub pip: String,
}

impl Default for PipResolver {
    fn default() -> Self {
        PipResolver {
            pip: "pip".to_string(),
        }
    }
}

impl PackageResolver for PipResolver {
    fn resolve(
        &self,
        requirement: &Requirement,
        output_dir: &Path,
        cache_dir: Option<&Path>,
        ctx: &Context,
    ) -> Result<Vec<PathBuf>> {
        let mut argv = vec![
            self.pip.clone(),
            "wheel".to_string(),
            "--wheel-dir".to_string(),
            output_dir.display().to_string(),
        ];
        if let Some(cache) = cache_dir {
            argv.push("--cache-dir".to_string());
            argv.push(cache.display().to_string());
        }
        match requirement {
            Requirement::Manifest(path) => {
                if !path.is_file() {
                    return Err(BundleError::Resolution(format!(
                        "requirements file {} not found",
                        path.display()
                    ))
                    .into());
                }
                argv.push("-r".to_string());
                argv.push(path.display().to_string());
            }
            Requirement::Package(spec) => argv.push(spec.clone()),
        }

        execute_command(&argv, ctx).map_err(|e| BundleError::Resolution(e.to_string()))?;
        list_dir(output_dir)
    }
}

/// Container formats found among resolved artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Zip,
    TarGz,
    TarBz2,
}

impl ContainerKind {
    /// Detect the container format from the file name
    pub fn detect(path: &Path) -> Option<ContainerKind> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".whl") || name.ends_with(".zip") {
            Some(ContainerKind::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ContainerKind::TarGz)
        } else if name.ends_with(".tar.bz2") || name.ends_with(".bz2") {
            Some(ContainerKind::TarBz2)
        } else {
            None
        }
    }

    /// File name with the container extension removed
    pub fn stem(self, path: &Path) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let lower = name.to_ascii_lowercase();
        let suffixes: &[&str] = match self {
            ContainerKind::Zip => &[".whl", ".zip"],
            ContainerKind::TarGz => &[".tar.gz", ".tgz"],
            ContainerKind::TarBz2 => &[".tar.bz2", ".bz2"],
        };
        suffixes
            .iter()
            .find(|suffix| lower.ends_with(*suffix))
            .map(|suffix| name[..name.len() - suffix.len()].to_string())
            .unwrap_or(name)
    }
}

/// Archives with the `unzip`, `tar` and `zip` programs
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellArchiver;

impl Archiver for ShellArchiver {
    fn unpack(&self, kind: ContainerKind, container: &Path, dest: &Path, ctx: &Context) -> Result<()> {
        fs::create_dir_all(dest)?;
        let container_arg = container.display().to_string();
        let dest_arg = dest.display().to_string();
        let argv: Vec<String> = match kind {
            ContainerKind::Zip => vec!["unzip", "-q", "-o", container_arg.as_str(), "-d", dest_arg.as_str()],
            ContainerKind::TarGz => vec!["tar", "xzf", container_arg.as_str(), "-C", dest_arg.as_str()],
            ContainerKind::TarBz2 => vec!["tar", "xjf", container_arg.as_str(), "-C", dest_arg.as_str()],
        }
        .into_iter()
        .map(str::to_string)
        .collect();

        execute_command(&argv, ctx).map_err(|e| BundleError::Archive {
            path: container.to_path_buf(),
            error: e.to_string(),
        })?;
        Ok(())
    }

    fn pack(&self, sources: &[PathBuf], archive: &Path, ctx: &mut Context) -> Result<()> {
        let argv: Vec<String> = ["zip", "-q", "-r", "-0"]
            .into_iter()
            .map(str::to_string)
            .chain([archive.display().to_string(), ".".to_string()])
            .collect();

        // Run from inside each source so its contents land at the archive root
        for source in sources {
            ctx.in_dir(source.clone(), |ctx| execute_command(&argv, ctx))
                .map_err(|e| BundleError::Archive {
                    path: archive.to_path_buf(),
                    error: e.to_string(),
                })?;
        }
        Ok(())
    }
}

/// Options for one bundling run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleOptions {
    pub requirement: Requirement,
    /// Package directory, relative to the project root
    pub dest: String,
    pub archive: bool,
    pub loader: bool,
    /// Startup file receiving the loader, relative to the project root
    pub startup: String,
    pub cache: Option<PathBuf>,
}

impl BundleOptions {
    /// Read options from task arguments
    pub fn from_args(args: &TaskArgs, root: &Path) -> Self {
        let requirement = match args.get("package") {
            Some(spec) if !spec.is_empty() => Requirement::Package(spec.to_string()),
            _ => Requirement::Manifest(root.join(args.get("requirements").unwrap_or("requirements.txt"))),
        };

        BundleOptions {
            requirement,
            dest: args.get("dest").unwrap_or("packages").to_string(),
            archive: args.enabled("archive"),
            loader: args.enabled("loader"),
            startup: args
                .get("startup")
                .unwrap_or("appengine_config.py")
                .to_string(),
            cache: args
                .get("cache")
                .map(|c| root.join(c))
                .or_else(default_cache_dir),
        }
    }
}

/// Per-user pip cache
fn default_cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fabengine").map(|dirs| dirs.cache_dir().join("pip"))
}

/// Outcome of a bundling run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleReport {
    pub package_dir: PathBuf,
    /// Entries added to the package directory, after unpacking
    pub installed: Vec<PathBuf>,
    pub archive: Option<PathBuf>,
    pub loader: Option<PathBuf>,
}

/// Runs the bundling workflow with pluggable resolver and archiver
#[derive(Clone)]
pub struct PackageBundler {
    resolver: Arc<dyn PackageResolver>,
    archiver: Arc<dyn Archiver>,
}

impl Default for PackageBundler {
    fn default() -> Self {
        PackageBundler::new(Arc::new(PipResolver::default()), Arc::new(ShellArchiver))
    }
}

impl PackageBundler {
    pub fn new(resolver: Arc<dyn PackageResolver>, archiver: Arc<dyn Archiver>) -> Self {
        PackageBundler { resolver, archiver }
    }

    /// The `bundle_packages` task
    pub fn task(self) -> Task {
        let defaults = TaskArgs::new()
            .option("requirements", "requirements.txt")
            .option("dest", "packages")
            .option("archive", "true")
            .option("loader", "false")
            .option("startup", "appengine_config.py");

        Task::new("bundle_packages", move |args, ctx| {
            let options = BundleOptions::from_args(args, ctx.root());
            let report = self.bundle(&options, ctx)?;
            ctx.print_info(&format!(
                "Bundled {} package(s) into {}",
                report.installed.len(),
                report.package_dir.display()
            ));
            Ok(())
        })
        .with_usage("Bundle requirements into the package directory")
        .with_defaults(defaults)
    }

    /// Run the bundling workflow
    pub fn bundle(&self, options: &BundleOptions, ctx: &mut Context) -> Result<BundleReport> {
        let staging = tempfile::Builder::new()
            .prefix("fabengine-staging-")
            .tempdir()?;
        log::debug!("staging directory {}", staging.path().display());

        let artifacts = self.resolver.resolve(
            &options.requirement,
            staging.path(),
            options.cache.as_deref(),
            ctx,
        )?;

        let package_dir = ctx.root().join(&options.dest);
        fs::create_dir_all(&package_dir)?;

        let mut report = BundleReport {
            package_dir: package_dir.clone(),
            ..Default::default()
        };

        for artifact in &artifacts {
            let Some(file_name) = artifact.file_name() else {
                continue;
            };
            let target = package_dir.join(file_name);
            move_file(artifact, &target)?;

            match ContainerKind::detect(&target) {
                Some(kind) => {
                    let unpacked = package_dir.join(kind.stem(&target));
                    self.archiver.unpack(kind, &target, &unpacked, ctx)?;
                    fs::remove_file(&target)?;
                    report.installed.push(unpacked);
                }
                None => report.installed.push(target),
            }
        }

        if options.archive {
            report.archive = Some(self.pack_package_dir(&package_dir, ctx)?);
        }

        if options.loader {
            let startup = ctx.root().join(&options.startup);
            install_loader(&startup, &options.dest)?;
            report.loader = Some(startup);
        }

        staging.close()?;
        Ok(report)
    }

    /// Pack every directory in the package directory into one zip, then remove them
    fn pack_package_dir(&self, package_dir: &Path, ctx: &mut Context) -> Result<PathBuf> {
        let name = package_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "packages".to_string());
        let archive = package_dir.join(format!("{}.zip", name));

        let sources: Vec<PathBuf> = list_dir(package_dir)?
            .into_iter()
            .filter(|p| p.is_dir())
            .collect();

        self.archiver.pack(&sources, &archive, ctx)?;
        for source in &sources {
            fs::remove_dir_all(source)?;
        }
        Ok(archive)
    }
}

/// Append the loader shim to a startup file, creating it if needed
///
/// Appends unconditionally; running twice leaves two loader blocks.
pub fn install_loader(startup: &Path, package_dir: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(startup)?;
    file.write_all(LOADER_TEMPLATE.replace("{package_dir}", package_dir).as_bytes())?;
    Ok(())
}

/// Move a file, copying when a rename cannot cross filesystems
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

/// Directory entries, sorted
fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}
