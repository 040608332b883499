//! Installation of nested application packages.
//!
//! A package may ship an application package `content/<id>.zip`, which is
//! handed to a [`PackageSystem`]. Installation runs in three stages (pre-install
//! validation, validation, install), each reporting a list of failures; an
//! empty list means the stage succeeded.

mod zip_system;

pub use zip_system::ZipPackageSystem;

use log::error;
use std::fmt;
use std::fs::File;
use std::path::Path;

use crate::{DeployError, Result};

/// One problem reported by a package system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// The archive entry or fragment the failure relates to
    pub subject: Option<String>,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            subject: None,
            message: message.into(),
        }
    }

    pub fn for_subject(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "{}: {}", subject, self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    PreInstall,
    Validate,
    Install,
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValidationStage::PreInstall => "Pre-install validation",
            ValidationStage::Validate => "Validation",
            ValidationStage::Install => "Install",
        })
    }
}

/// A package installation in progress.
pub trait InstallProcess {
    /// Failures found while opening the package.
    fn pre_install_validation(&self) -> &[ValidationFailure];

    fn validate(&mut self) -> Vec<ValidationFailure>;

    fn install(&mut self) -> Vec<ValidationFailure>;
}

/// The package system nested application packages are installed through.
pub trait PackageSystem: Send + Sync {
    fn begin_install(&self, archive: File, overwrite: bool) -> Result<Box<dyn InstallProcess>>;
}

/// Run all install stages for `archive_path`, failing on the first stage that reports anything.
///
/// Every failure of that stage is logged and carried in the error.
pub fn install_archive(system: &dyn PackageSystem, archive_path: &Path, overwrite: bool) -> Result<()> {
    let archive = File::open(archive_path).map_err(|e| DeployError::io(archive_path, e))?;
    let mut process = system.begin_install(archive, overwrite)?;

    ensure_clean(ValidationStage::PreInstall, process.pre_install_validation())?;
    ensure_clean(ValidationStage::Validate, &process.validate())?;
    ensure_clean(ValidationStage::Install, &process.install())?;
    Ok(())
}

fn ensure_clean(stage: ValidationStage, failures: &[ValidationFailure]) -> Result<()> {
    if failures.is_empty() {
        return Ok(());
    }

    for failure in failures {
        error!("{}: {}", stage, failure);
    }

    Err(DeployError::ValidationFailed {
        stage,
        messages: failures.iter().map(ToString::to_string).collect(),
    })
}
