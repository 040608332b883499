//! Uninstall command - remove a package from the local repository.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;
use std::sync::Arc;

use nudeploy_pm::{AssemblyRegistry, PackageManager, PackageRef};

#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Package id
    pub id: String,

    /// Package version
    pub version: String,

    /// Application root
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,
}

pub fn execute(args: UninstallArgs) -> Result<i32> {
    let config = crate::load_config(&args.working_dir, None)?;
    let manager = PackageManager::from_config(&config, Arc::new(AssemblyRegistry::new()))
        .context("Failed to set up the package manager")?;

    let package = PackageRef::new(args.id, args.version);
    manager
        .uninstall(&package)
        .with_context(|| format!("Failed to uninstall {}", package))?;

    println!("{} {}", style("Removed").green().bold(), style(&package).cyan());
    println!("Deployed files were left in place.");
    Ok(0)
}
