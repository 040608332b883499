//! Error type for package deployment.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use nudeploy_rules::RuleError;

use crate::nested::ValidationStage;
use crate::package::PackageRef;

pub type Result<T> = std::result::Result<T, DeployError>;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error(transparent)]
    Rules(#[from] RuleError),

    #[error("Failed installing nested package {} of {package}: {source}", .archive.display())]
    NestedPackageInstallFailed {
        package: PackageRef,
        archive: PathBuf,
        #[source]
        source: Box<DeployError>,
    },

    #[error("{stage} reported {} failure(s): {}", .messages.len(), .messages.join("; "))]
    ValidationFailed {
        stage: ValidationStage,
        messages: Vec<String>,
    },

    #[error("Failed to copy {} to {}: {source}", .from.display(), .to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid package archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Invalid package manifest in {}: {message}", .path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("Failed to register assembly {}: {message}", .path.display())]
    Registry { path: PathBuf, message: String },

    #[error("Invalid configuration {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("Package {0} is not installed")]
    NotInstalled(PackageRef),
}

impl DeployError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DeployError::Io {
            path: path.into(),
            source,
        }
    }
}
