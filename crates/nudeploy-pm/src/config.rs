//! Deployment configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use nudeploy_rules::AppLayout;

use crate::{DeployError, Result};

/// Layout and sources used when deploying packages into an application.
///
/// Read from `nudeploy.toml` in the application root when present. Every key
/// is optional. Path settings expand `$VAR` environment references only; a
/// leading `~` means the application root, not the user's home directory,
/// and other relative paths are relative to the application root too:
///
/// ```toml
/// bin-dir = "Bin"
/// frontend-dir = "Frontend"
/// rules-file = "~/App_Data/nuget/nuget.mapping.rules.xml"
/// packages-dir = "$NUGET_PACKAGES"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DeployConfig {
    /// Application root, the directory holding the config file
    #[serde(skip)]
    pub app_root: PathBuf,
    /// Binaries folder, relative to the root
    pub bin_dir: String,
    /// Front-end assets root, relative to the root
    pub frontend_dir: String,
    /// Mapping rule document
    pub rules_file: String,
    /// Local package repository
    pub packages_dir: String,
    /// Remote package source the repository was fetched from
    pub repository_url: String,
    /// `lib/` folders to take binaries from, in priority order
    pub lib_frameworks: Vec<String>,
    /// Content directories that default to the front-end root
    pub frontend_dirs: Vec<String>,
    /// Let nested application packages overwrite existing files
    pub overwrite_nested: bool,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            app_root: PathBuf::from("."),
            bin_dir: "Bin".to_string(),
            frontend_dir: "Frontend".to_string(),
            rules_file: "~/App_Data/nuget/nuget.mapping.rules.xml".to_string(),
            packages_dir: "~/App_Data/nuget/packages".to_string(),
            repository_url: "https://www.nuget.org/api/v2/".to_string(),
            lib_frameworks: vec![
                "net45".to_string(),
                "net45-Client".to_string(),
                "net40".to_string(),
                "net40-Client".to_string(),
            ],
            frontend_dirs: vec!["scripts".to_string(), "content".to_string()],
            overwrite_nested: true,
        }
    }
}

impl DeployConfig {
    pub const FILE_NAME: &'static str = "nudeploy.toml";

    /// Default configuration for an application root.
    pub fn for_app(app_root: impl Into<PathBuf>) -> Self {
        Self {
            app_root: app_root.into(),
            ..Default::default()
        }
    }

    /// Load `nudeploy.toml` from the application root, falling back to defaults.
    pub fn load(app_root: &Path) -> Result<Self> {
        let path = app_root.join(Self::FILE_NAME);
        if !path.exists() {
            return Ok(Self::for_app(app_root));
        }

        let content = fs::read_to_string(&path).map_err(|e| DeployError::io(&path, e))?;
        let mut config: DeployConfig = toml::from_str(&content).map_err(|e| DeployError::Config {
            path: path.clone(),
            message: e.to_string(),
        })?;
        config.app_root = app_root.to_path_buf();
        Ok(config)
    }

    pub fn layout(&self) -> AppLayout {
        AppLayout::new(&self.app_root)
            .with_bin_dir(&self.bin_dir)
            .with_frontend_dir(&self.frontend_dir)
            .with_frontend_dirs(self.frontend_dirs.clone())
    }

    pub fn rules_path(&self) -> Result<PathBuf> {
        self.resolve_setting(&self.rules_file)
    }

    pub fn packages_path(&self) -> Result<PathBuf> {
        self.resolve_setting(&self.packages_dir)
    }

    /// Expand environment variables; absolute results are used as-is,
    /// anything else is relative to the application root.
    fn resolve_setting(&self, value: &str) -> Result<PathBuf> {
        let expanded = shellexpand::env(value).map_err(|e| DeployError::Config {
            path: self.app_root.join(Self::FILE_NAME),
            message: format!("cannot expand '{}': {}", value, e),
        })?;

        let path = Path::new(expanded.as_ref());
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.layout().resolve(&expanded))
        }
    }
}
