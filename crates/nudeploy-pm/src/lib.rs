//! Post-install deployment of packages into a web application.
//!
//! A [`PackageManager`] unpacks package archives into a local repository and
//! raises lifecycle events. The [`ContentDeployer`] listener reacts to
//! post-install events by copying binaries into the application's binaries
//! folder, routing content through the mapping rules, installing nested
//! application packages and registering new assemblies.

pub mod config;
pub mod error;
pub mod event;
pub mod installer;
pub mod nested;
pub mod package;
pub mod registry;
pub mod repository;

pub use config::DeployConfig;
pub use error::{DeployError, Result};
pub use event::{EventDispatcher, EventListener, EventType, InstallLogger, PackageEvent};
pub use installer::{ContentDeployer, DeployReport, FilePlacement, InstallResult, PackageManager};
pub use nested::{InstallProcess, PackageSystem, ValidationFailure, ValidationStage, ZipPackageSystem};
pub use package::PackageRef;
pub use registry::{AssemblyRegistry, TypeRegistry};
pub use repository::{FsRepository, LocalRepository};
