//! Package manager - unpacks packages and raises lifecycle events.

use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nudeploy_rules::{MappingRules, PathRemapper};

use super::deployer::ContentDeployer;
use crate::config::DeployConfig;
use crate::event::{EventDispatcher, EventType, InstallLogger, PackageEvent};
use crate::nested::ZipPackageSystem;
use crate::package::PackageRef;
use crate::registry::TypeRegistry;
use crate::repository::{FsRepository, LocalRepository};
use crate::{DeployError, Result};

/// Result of installing one package archive
#[derive(Debug, Clone)]
pub struct InstallResult {
    pub package: PackageRef,
    /// Where the package was unpacked in the local repository
    pub install_path: PathBuf,
}

/// Installs package archives into the local repository.
///
/// Installs are not serialised; callers must not run two at once against the
/// same application.
pub struct PackageManager {
    repository: Arc<dyn LocalRepository>,
    dispatcher: EventDispatcher,
}

impl PackageManager {
    pub fn new(repository: Arc<dyn LocalRepository>, dispatcher: EventDispatcher) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Standard setup for an application: mapping rules loaded once for the
    /// process, nested packages extracted into the application root, and the
    /// install logger and content deployer listening.
    pub fn from_config(config: &DeployConfig, type_registry: Arc<dyn TypeRegistry>) -> Result<Self> {
        let rules = nudeploy_rules::load_rules(&config.rules_path()?)?;
        Self::with_rules(config, rules, type_registry)
    }

    /// Same as [`PackageManager::from_config`] with an explicit rule table.
    pub fn with_rules(
        config: &DeployConfig,
        rules: Arc<MappingRules>,
        type_registry: Arc<dyn TypeRegistry>,
    ) -> Result<Self> {
        let layout = config.layout();
        let package_system = Arc::new(ZipPackageSystem::new(layout.root()));
        let deployer = ContentDeployer::new(
            PathRemapper::new(rules, layout),
            config.lib_frameworks.clone(),
            package_system,
            type_registry,
        )
        .with_overwrite_nested(config.overwrite_nested);

        let dispatcher = EventDispatcher::new()
            .with_listener(Arc::new(InstallLogger))
            .with_listener(Arc::new(deployer));

        let repository = Arc::new(FsRepository::new(config.packages_path()?));
        info!(
            "Package repository {} (source {})",
            repository.root().display(),
            config.repository_url
        );

        Ok(Self::new(repository, dispatcher))
    }

    pub fn repository(&self) -> &dyn LocalRepository {
        self.repository.as_ref()
    }

    /// Install a package archive.
    ///
    /// When the nested application package fails, the package is removed
    /// from the local repository again before the error is returned.
    pub fn install(&self, archive_path: &Path) -> Result<InstallResult> {
        let package = PackageRef::from_archive(archive_path)?;
        let install_path = self.repository.install_path(&package);

        self.dispatcher
            .dispatch(&PackageEvent::new(EventType::PreInstall, &package, &install_path))?;

        let install_path = self.repository.add_package(&package, archive_path)?;

        let installed = PackageEvent::new(EventType::PostInstall, &package, &install_path);
        if let Err(e) = self.dispatcher.dispatch(&installed) {
            if matches!(e, DeployError::NestedPackageInstallFailed { .. }) {
                warn!("Removing {} after nested package failure", package);
                if let Err(remove_err) = self.repository.remove_package(&package) {
                    error!("Failed to remove {}: {}", package, remove_err);
                }
            }
            return Err(e);
        }

        Ok(InstallResult {
            package,
            install_path,
        })
    }

    /// Remove a package from the local repository.
    ///
    /// Files deployed into the application are left in place.
    pub fn uninstall(&self, package: &PackageRef) -> Result<()> {
        if !self.repository.is_installed(package) {
            return Err(DeployError::NotInstalled(package.clone()));
        }

        let install_path = self.repository.install_path(package);
        self.dispatcher
            .dispatch(&PackageEvent::new(EventType::PreUninstall, package, &install_path))?;
        self.repository.remove_package(package)?;
        self.dispatcher
            .dispatch(&PackageEvent::new(EventType::PostUninstall, package, &install_path))
    }
}
