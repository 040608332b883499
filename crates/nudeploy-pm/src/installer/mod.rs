//! Package installation and deployment.
//!
//! The [`PackageManager`] unpacks archives into the local repository and
//! raises lifecycle events; the [`ContentDeployer`] is the post-install
//! listener that moves files into the application.

mod deployer;
mod manager;
mod placement;

#[cfg(test)]
mod tests;

pub use deployer::{ContentDeployer, DeployReport};
pub use manager::{InstallResult, PackageManager};
pub use placement::{binary_placements, content_placements, select_lib_dir, ContentPlan, FilePlacement};
