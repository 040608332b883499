//! Install command - install package archives into the application.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;
use std::sync::Arc;

use nudeploy_pm::{AssemblyRegistry, PackageManager};

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Package archives (.nupkg) to install, in order
    #[arg(value_name = "PACKAGES", required = true)]
    pub packages: Vec<PathBuf>,

    /// Mapping rule document (defaults to the configured one)
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Application root
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,
}

pub fn execute(args: InstallArgs) -> Result<i32> {
    let config = crate::load_config(&args.working_dir, args.rules.as_deref())?;
    let layout = config.layout();

    let registry = Arc::new(AssemblyRegistry::new());
    let manager = PackageManager::from_config(&config, registry.clone())
        .context("Failed to set up the package manager")?;

    for archive in &args.packages {
        let result = manager
            .install(archive)
            .with_context(|| format!("Failed to install {}", archive.display()))?;

        println!(
            "{} {} into {}",
            style("Installed").green().bold(),
            style(&result.package).cyan(),
            result.install_path.display()
        );
    }

    for assembly in registry.assemblies() {
        let shown = layout
            .to_app_path(&assembly)
            .unwrap_or_else(|| assembly.display().to_string());
        println!("  Registered {}", shown);
    }

    Ok(0)
}
