//! Integration tests for the package bundler

mod common;

use common::*;
use fabengine::error::{BundleError, FabengineError};
use fabengine::runner::{TaskArgs, TaskRegistry};
use fabengine::tasks::{BundleOptions, PackageBundler, Requirement};
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn options(root: &Path) -> BundleOptions {
    BundleOptions {
        requirement: Requirement::Manifest(root.join("requirements.txt")),
        dest: "packages".to_string(),
        archive: false,
        loader: false,
        startup: "appengine_config.py".to_string(),
        cache: None,
    }
}

fn entry_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_bundle_unpacks_artifacts() {
    let (project, mut ctx, _) = recording_context();
    let resolver = Arc::new(FakeResolver::new(&["p1.whl", "p2.whl"]));
    let bundler = PackageBundler::new(resolver.clone(), Arc::new(FakeArchiver::default()));

    let report = bundler.bundle(&options(project.path()), &mut ctx).unwrap();

    let package_dir = project.path().join("packages");
    assert_eq!(report.package_dir, package_dir);
    assert_eq!(entry_names(&package_dir), vec!["p1", "p2"]);
    assert_eq!(
        fs::read_to_string(package_dir.join("p1").join("__init__.py")).unwrap(),
        "contents of p1.whl"
    );
    assert!(report.archive.is_none());
    assert!(report.loader.is_none());

    let staging = resolver.staging_dirs();
    assert_eq!(staging.len(), 1);
    assert!(!staging[0].exists());
}

#[test]
fn test_plain_artifacts_are_moved_as_is() {
    let (project, mut ctx, _) = recording_context();
    let resolver = Arc::new(FakeResolver::new(&["notes.txt"]));
    let bundler = PackageBundler::new(resolver, Arc::new(FakeArchiver::default()));

    let report = bundler.bundle(&options(project.path()), &mut ctx).unwrap();

    assert_eq!(report.installed, vec![project.path().join("packages").join("notes.txt")]);
}

#[test]
fn test_resolution_failure_removes_staging() {
    let (project, mut ctx, _) = recording_context();
    let resolver = Arc::new(FakeResolver {
        fail: true,
        ..FakeResolver::new(&["p1.whl"])
    });
    let bundler = PackageBundler::new(resolver.clone(), Arc::new(FakeArchiver::default()));

    let result = bundler.bundle(&options(project.path()), &mut ctx);

    assert!(matches!(
        result,
        Err(FabengineError::Bundle(BundleError::Resolution(_)))
    ));
    assert!(!resolver.staging_dirs()[0].exists());
    assert!(!project.path().join("packages").exists());
}

#[test]
fn test_unpack_failure_leaves_partial_package_dir() {
    let (project, mut ctx, _) = recording_context();
    let resolver = Arc::new(FakeResolver::new(&["p1.whl", "p2.whl"]));
    let archiver = FakeArchiver {
        fail_on: Some("p2".to_string()),
        ..Default::default()
    };
    let bundler = PackageBundler::new(resolver.clone(), Arc::new(archiver));

    let result = bundler.bundle(&options(project.path()), &mut ctx);

    assert!(matches!(
        result,
        Err(FabengineError::Bundle(BundleError::Archive { .. }))
    ));
    assert!(!resolver.staging_dirs()[0].exists());
    // Already installed work is kept; nothing is rolled back
    assert_eq!(
        entry_names(&project.path().join("packages")),
        vec!["p1", "p2.whl"]
    );
}

#[test]
fn test_archive_packs_package_dir() {
    let (project, mut ctx, _) = recording_context();
    let resolver = Arc::new(FakeResolver::new(&["p1.whl", "p2.whl"]));
    let archiver = Arc::new(FakeArchiver::default());
    let bundler = PackageBundler::new(resolver.clone(), archiver.clone());

    let mut opts = options(project.path());
    opts.archive = true;
    let report = bundler.bundle(&opts, &mut ctx).unwrap();

    let package_dir = project.path().join("packages");
    let archive = package_dir.join("packages.zip");
    assert_eq!(report.archive, Some(archive.clone()));
    assert_eq!(entry_names(&package_dir), vec!["packages.zip"]);

    let packed = archiver.packed.lock().unwrap();
    assert_eq!(packed.len(), 1);
    assert_eq!(packed[0].0, vec![package_dir.join("p1"), package_dir.join("p2")]);
    assert_eq!(packed[0].1, archive);
    assert!(!resolver.staging_dirs()[0].exists());
}

#[test]
fn test_loader_appended_on_every_run() {
    let (project, mut ctx, _) = recording_context();
    let startup = project.path().join("appengine_config.py");
    fs::write(&startup, "import logging\n").unwrap();

    let bundler = PackageBundler::new(
        Arc::new(FakeResolver::new(&["p1.whl"])),
        Arc::new(FakeArchiver::default()),
    );
    let mut opts = options(project.path());
    opts.loader = true;

    bundler.bundle(&opts, &mut ctx).unwrap();
    let report = bundler.bundle(&opts, &mut ctx).unwrap();

    // No guard against installing twice: each run adds another block
    let contents = fs::read_to_string(&startup).unwrap();
    assert!(contents.starts_with("import logging\n"));
    assert_eq!(contents.matches("# Added by fabengine").count(), 2);
    assert_eq!(contents.matches(r#""packages")"#).count(), 2);
    assert_eq!(report.loader, Some(startup));
}

#[test]
fn test_task_defaults_to_archive() {
    let (project, mut ctx, _) = recording_context();
    let resolver = Arc::new(FakeResolver::new(&["p1.whl"]));
    let archiver = Arc::new(FakeArchiver::default());

    let mut registry = TaskRegistry::new();
    registry.register(PackageBundler::new(resolver, archiver.clone()).task());

    registry
        .invoke("bundle_packages", &TaskArgs::new(), &mut ctx)
        .unwrap();
    assert_eq!(archiver.packed.lock().unwrap().len(), 1);
    assert!(project.path().join("packages").join("packages.zip").is_file());
    assert!(!project.path().join("appengine_config.py").exists());
}

#[test]
fn test_task_options_override_defaults() {
    let (project, mut ctx, _) = recording_context();
    let archiver = Arc::new(FakeArchiver::default());

    let mut registry = TaskRegistry::new();
    registry.register(
        PackageBundler::new(Arc::new(FakeResolver::new(&["p1.whl"])), archiver.clone()).task(),
    );

    let args = TaskArgs::parse(["archive=false", "loader", "dest=lib"]);
    registry.invoke("bundle_packages", &args, &mut ctx).unwrap();

    assert!(archiver.packed.lock().unwrap().is_empty());
    assert_eq!(entry_names(&project.path().join("lib")), vec!["p1"]);
    let startup = fs::read_to_string(project.path().join("appengine_config.py")).unwrap();
    assert!(startup.contains(r#""lib")"#));
}
