//! End-to-end install tests against a temporary application root.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use nudeploy_rules::{MappingRules, PackageRule};

use super::*;
use crate::config::DeployConfig;
use crate::registry::AssemblyRegistry;
use crate::{DeployError, PackageRef, ValidationStage};

fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, content) in files {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn nuspec(id: &str, version: &str) -> Vec<u8> {
    format!(
        "<?xml version=\"1.0\"?><package><metadata><id>{}</id><version>{}</version></metadata></package>",
        id, version
    )
    .into_bytes()
}

/// Write a `.nupkg` with the given extra files next to the application.
fn write_package(dir: &Path, id: &str, version: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let manifest_name = format!("{}.nuspec", id);
    let manifest = nuspec(id, version);

    let mut all: Vec<(&str, &[u8])> = vec![(manifest_name.as_str(), manifest.as_slice())];
    all.extend_from_slice(files);

    let path = dir.join(format!("{}.{}.nupkg", id, version));
    File::create(&path).unwrap().write_all(&zip_bytes(&all)).unwrap();
    path
}

struct Fixture {
    temp: TempDir,
    site: PathBuf,
    registry: Arc<AssemblyRegistry>,
    manager: PackageManager,
}

fn fixture(rules: MappingRules) -> Fixture {
    let temp = TempDir::new().unwrap();
    let site = temp.path().join("site");
    fs::create_dir_all(&site).unwrap();

    let registry = Arc::new(AssemblyRegistry::new());
    let config = DeployConfig::for_app(&site);
    let manager = PackageManager::with_rules(&config, Arc::new(rules), registry.clone()).unwrap();

    Fixture {
        temp,
        site,
        registry,
        manager,
    }
}

#[test]
fn test_install_deploys_binaries_and_content() {
    let rules = MappingRules::new(vec![
        PackageRule::new("foo").with_path("Content", "~/CustomRoot/{ver}")
    ])
    .unwrap();
    let f = fixture(rules);

    let archive = write_package(
        f.temp.path(),
        "Foo",
        "1.2.0",
        &[
            ("lib/net40/Foo.dll", b"net40"),
            ("lib/net45/Foo.dll", b"net45"),
            ("lib/net45/Foo.xml", b"<doc/>"),
            ("content/content/readme.txt", b"read me"),
            ("content/Scripts/app.js", b"app()"),
            ("content/Views/Foo/Index.cshtml", b"<h1/>"),
            ("content/robots.txt", b"User-agent: *"),
        ],
    );

    let result = f.manager.install(&archive).unwrap();
    assert_eq!(result.package, PackageRef::new("Foo", "1.2.0"));
    assert!(f.manager.repository().is_installed(&result.package));

    let site = &f.site;
    assert_eq!(fs::read(site.join("Bin/Foo.dll")).unwrap(), b"net45");
    assert!(site.join("Bin/Foo.xml").is_file());
    assert_eq!(fs::read(site.join("CustomRoot/1.2.0/readme.txt")).unwrap(), b"read me");
    assert_eq!(fs::read(site.join("Frontend/Scripts/app.js")).unwrap(), b"app()");
    assert!(site.join("Views/Foo/Index.cshtml").is_file());
    assert!(site.join("Frontend/robots.txt").is_file());

    assert_eq!(f.registry.assemblies(), vec![site.join("Bin/Foo.dll")]);
}

#[test]
fn test_install_without_known_lib_folder_copies_no_binaries() {
    let f = fixture(MappingRules::default());
    let archive = write_package(
        f.temp.path(),
        "Bar",
        "0.1.0",
        &[("lib/netstandard2.0/Bar.dll", b"x"), ("content/scripts/bar.js", b"bar()")],
    );

    f.manager.install(&archive).unwrap();

    assert!(!f.site.join("Bin").exists());
    assert!(f.site.join("Frontend/scripts/bar.js").is_file());
    assert!(f.registry.assemblies().is_empty());
}

#[test]
fn test_rule_can_route_assemblies_into_bin() {
    let rules = MappingRules::new(vec![
        PackageRule::new("Plugin").with_path("modules", "~/Bin/Modules/{ver}")
    ])
    .unwrap();
    let f = fixture(rules);
    let archive = write_package(
        f.temp.path(),
        "Plugin",
        "2.0.0",
        &[("content/modules/Plugin.Module.dll", b"MZ")],
    );

    f.manager.install(&archive).unwrap();

    let module = f.site.join("Bin/Modules/2.0.0/Plugin.Module.dll");
    assert!(module.is_file());
    assert!(f.registry.contains(&module));
}

#[test]
fn test_nested_package_is_installed_first() {
    let f = fixture(MappingRules::default());
    let nested = zip_bytes(&[("App_Data/Foo/install.xml", b"<install/>")]);
    let archive = write_package(
        f.temp.path(),
        "Foo",
        "1.0.0",
        &[("content/Foo.zip", nested.as_slice()), ("content/site.css", b"body{}")],
    );

    f.manager.install(&archive).unwrap();

    assert!(f.site.join("App_Data/Foo/install.xml").is_file());
    assert!(f.site.join("Frontend/site.css").is_file());
    // The nested archive itself is not copied
    assert!(!f.site.join("Frontend/Foo.zip").exists());
}

#[test]
fn test_nested_failure_rolls_back_registration() {
    let f = fixture(MappingRules::default());
    let archive = write_package(
        f.temp.path(),
        "Foo",
        "1.0.0",
        &[
            ("lib/net45/Foo.dll", b"MZ"),
            ("content/Foo.zip", b"not a zip archive"),
            ("content/site.css", b"body{}"),
        ],
    );

    let err = f.manager.install(&archive).unwrap_err();
    match &err {
        DeployError::NestedPackageInstallFailed {
            package,
            archive,
            source,
        } => {
            assert_eq!(package, &PackageRef::new("Foo", "1.0.0"));
            assert!(archive.ends_with("content/Foo.zip"));
            assert!(matches!(
                **source,
                DeployError::ValidationFailed {
                    stage: ValidationStage::PreInstall,
                    ..
                }
            ));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(!f.manager.repository().is_installed(&PackageRef::new("Foo", "1.0.0")));
    assert!(!f.site.join("Bin/Foo.dll").exists());
    assert!(!f.site.join("Frontend/site.css").exists());
    assert!(f.registry.assemblies().is_empty());
}

#[test]
fn test_copy_failure_stops_deployment() {
    let f = fixture(MappingRules::default());
    let archive = write_package(
        f.temp.path(),
        "Foo",
        "1.0.0",
        &[
            ("lib/net45/Foo.dll", b"MZ"),
            ("content/scripts/a.js", b"a()"),
            ("content/scripts/b.js", b"b()"),
            ("content/scripts/c.js", b"c()"),
        ],
    );

    // A directory in the way of one target
    let blocked = f.site.join("Frontend/scripts/b.js");
    fs::create_dir_all(&blocked).unwrap();

    let err = f.manager.install(&archive).unwrap_err();
    match &err {
        DeployError::CopyFailed { from, to, .. } => {
            assert!(from.ends_with("content/scripts/b.js"));
            assert_eq!(to, &blocked);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Earlier copies stay, later ones never happen
    assert!(f.site.join("Bin/Foo.dll").is_file());
    assert_eq!(fs::read(f.site.join("Frontend/scripts/a.js")).unwrap(), b"a()");
    assert!(blocked.is_dir());
    assert!(!f.site.join("Frontend/scripts/c.js").exists());
    assert!(f.registry.assemblies().is_empty());

    // Only nested failures undo the registration
    assert!(f.manager.repository().is_installed(&PackageRef::new("Foo", "1.0.0")));
}

#[test]
fn test_install_rejects_path_like_package_id() {
    let f = fixture(MappingRules::default());
    let victim = f.site.join("App_Data/victim.1.0.0");
    fs::create_dir_all(&victim).unwrap();
    fs::write(victim.join("keep.txt"), "keep").unwrap();

    let path = f.temp.path().join("evil.nupkg");
    let manifest = nuspec("../../victim", "1.0.0");
    fs::write(&path, zip_bytes(&[("evil.nuspec", manifest.as_slice())])).unwrap();

    assert!(matches!(
        f.manager.install(&path),
        Err(DeployError::Manifest { .. })
    ));
    assert!(victim.join("keep.txt").is_file());
}

#[test]
fn test_install_rejects_archive_without_manifest() {
    let f = fixture(MappingRules::default());
    let path = f.temp.path().join("anonymous.nupkg");
    fs::write(&path, zip_bytes(&[("content/a.txt", b"a")])).unwrap();

    assert!(matches!(
        f.manager.install(&path),
        Err(DeployError::Manifest { .. })
    ));
}

#[test]
fn test_uninstall_keeps_deployed_files() {
    let f = fixture(MappingRules::default());
    let archive = write_package(f.temp.path(), "Foo", "1.0.0", &[("content/scripts/foo.js", b"foo()")]);
    let result = f.manager.install(&archive).unwrap();

    f.manager.uninstall(&result.package).unwrap();

    assert!(!result.install_path.exists());
    assert!(f.site.join("Frontend/scripts/foo.js").is_file());
    assert!(matches!(
        f.manager.uninstall(&result.package),
        Err(DeployError::NotInstalled(_))
    ));
}

#[test]
fn test_deployer_ignores_other_events() {
    use crate::event::{EventListener, EventType, PackageEvent};
    use crate::nested::ZipPackageSystem;
    use nudeploy_rules::{AppLayout, PathRemapper};

    let temp = TempDir::new().unwrap();
    let install = temp.path().join("Foo.1.0.0");
    fs::create_dir_all(install.join("content/scripts")).unwrap();
    fs::write(install.join("content/scripts/foo.js"), "foo()").unwrap();

    let site = temp.path().join("site");
    let deployer = ContentDeployer::new(
        PathRemapper::new(Arc::new(MappingRules::default()), AppLayout::new(&site)),
        vec!["net45".to_string()],
        Arc::new(ZipPackageSystem::new(&site)),
        Arc::new(AssemblyRegistry::new()),
    );

    let package = PackageRef::new("Foo", "1.0.0");
    for event_type in [EventType::PreInstall, EventType::PreUninstall, EventType::PostUninstall] {
        deployer
            .handle(&PackageEvent::new(event_type, &package, &install))
            .unwrap();
    }
    assert!(!site.exists());

    deployer
        .handle(&PackageEvent::new(EventType::PostInstall, &package, &install))
        .unwrap();
    assert!(site.join("Frontend/scripts/foo.js").is_file());
}

#[test]
fn test_deploy_report() {
    let temp = TempDir::new().unwrap();
    let install = temp.path().join("Foo.1.0.0");
    fs::create_dir_all(install.join("lib/net45")).unwrap();
    fs::write(install.join("lib/net45/Foo.dll"), "MZ").unwrap();
    fs::create_dir_all(install.join("content")).unwrap();
    fs::write(install.join("content/Foo.zip"), zip_bytes(&[("a.txt", b"a")])).unwrap();

    let site = temp.path().join("site");
    let registry = Arc::new(AssemblyRegistry::new());
    let deployer = ContentDeployer::new(
        nudeploy_rules::PathRemapper::new(
            Arc::new(MappingRules::default()),
            nudeploy_rules::AppLayout::new(&site),
        ),
        vec!["net45".to_string()],
        Arc::new(crate::nested::ZipPackageSystem::new(&site)),
        registry.clone(),
    );

    let report = deployer.deploy(&PackageRef::new("Foo", "1.0.0"), &install).unwrap();
    assert_eq!(report.placements.len(), 1);
    assert_eq!(report.nested_archive, Some(install.join("content/Foo.zip")));
    assert_eq!(report.assemblies, vec![site.join("Bin/Foo.dll")]);
    assert!(site.join("a.txt").is_file());
}
