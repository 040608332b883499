//! Post-install hook that deploys package files into the application.

use log::{debug, info};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use nudeploy_rules::PathRemapper;

use super::placement::{binary_placements, content_placements, FilePlacement};
use crate::event::{EventListener, EventType, PackageEvent};
use crate::nested::{install_archive, PackageSystem};
use crate::package::PackageRef;
use crate::registry::TypeRegistry;
use crate::{DeployError, Result};

/// What a deployment did.
#[derive(Debug, Default)]
pub struct DeployReport {
    /// Files copied, in copy order
    pub placements: Vec<FilePlacement>,
    /// Nested application package that was installed
    pub nested_archive: Option<PathBuf>,
    /// Assemblies handed to the type registry
    pub assemblies: Vec<PathBuf>,
}

/// Copies an installed package's binaries and content into the application.
pub struct ContentDeployer {
    remapper: PathRemapper,
    frameworks: Vec<String>,
    package_system: Arc<dyn PackageSystem>,
    type_registry: Arc<dyn TypeRegistry>,
    overwrite_nested: bool,
}

impl ContentDeployer {
    pub fn new(
        remapper: PathRemapper,
        frameworks: Vec<String>,
        package_system: Arc<dyn PackageSystem>,
        type_registry: Arc<dyn TypeRegistry>,
    ) -> Self {
        Self {
            remapper,
            frameworks,
            package_system,
            type_registry,
            overwrite_nested: true,
        }
    }

    pub fn with_overwrite_nested(mut self, overwrite: bool) -> Self {
        self.overwrite_nested = overwrite;
        self
    }

    pub fn remapper(&self) -> &PathRemapper {
        &self.remapper
    }

    /// Deploy a package unpacked at `install_path`.
    ///
    /// A nested application package is installed before any file is copied.
    /// Files copied before a failure stay where they are.
    pub fn deploy(&self, package: &PackageRef, install_path: &Path) -> Result<DeployReport> {
        let bin_root = self.remapper.layout().bin_root();

        let mut placements = binary_placements(install_path, &self.frameworks, &bin_root)?;
        let content = content_placements(install_path, package, &self.remapper)?;
        placements.extend(content.placements);

        if let Some(archive) = &content.nested_archive {
            info!("Installing nested package {}", archive.display());
            install_archive(self.package_system.as_ref(), archive, self.overwrite_nested).map_err(
                |source| DeployError::NestedPackageInstallFailed {
                    package: package.clone(),
                    archive: archive.clone(),
                    source: Box::new(source),
                },
            )?;
        }

        for placement in &placements {
            debug!(
                "Copying {} -> {}",
                placement.source.display(),
                placement.target.display()
            );
            placement.copy()?;
        }

        let mut assemblies = Vec::new();
        for placement in &placements {
            if is_assembly(&placement.target, &bin_root) {
                self.type_registry.register_assembly(&placement.target)?;
                assemblies.push(placement.target.clone());
            }
        }

        Ok(DeployReport {
            placements,
            nested_archive: content.nested_archive,
            assemblies,
        })
    }
}

impl EventListener for ContentDeployer {
    fn handle(&self, event: &PackageEvent<'_>) -> Result<()> {
        if event.event_type != EventType::PostInstall {
            return Ok(());
        }

        let report = self.deploy(event.package, event.install_path)?;
        info!(
            "Deployed {}: {} file(s), {} assembly(ies)",
            event.package,
            report.placements.len(),
            report.assemblies.len()
        );
        Ok(())
    }
}

/// A `.dll` below the binaries root, both compared case-insensitively.
fn is_assembly(target: &Path, bin_root: &Path) -> bool {
    let is_dll = target
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("dll"))
        .unwrap_or(false);

    is_dll && starts_with_ignore_case(target, bin_root)
}

fn starts_with_ignore_case(path: &Path, prefix: &Path) -> bool {
    let mut components = path.components();
    prefix.components().all(|expected| {
        components
            .next()
            .map(|actual| component_eq(actual, expected))
            .unwrap_or(false)
    })
}

fn component_eq(a: Component<'_>, b: Component<'_>) -> bool {
    a.as_os_str()
        .to_string_lossy()
        .eq_ignore_ascii_case(&b.as_os_str().to_string_lossy())
}
