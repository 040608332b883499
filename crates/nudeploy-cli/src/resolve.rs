//! Resolve command - show where a package content file is deployed.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use nudeploy_rules::PathRemapper;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Package id
    #[arg(long = "package", short = 'p')]
    pub package_id: String,

    /// Package version
    #[arg(long = "package-version")]
    pub package_version: String,

    /// Top-level directory inside the package's content folder
    pub dir: String,

    /// File path relative to that directory
    pub file: PathBuf,

    /// Mapping rule document (defaults to the configured one)
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Print the absolute path instead of the ~/ form
    #[arg(long)]
    pub absolute: bool,

    /// Application root
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,
}

pub fn execute(args: ResolveArgs) -> Result<i32> {
    let config = crate::load_config(&args.working_dir, args.rules.as_deref())?;
    let rules_path = config.rules_path()?;
    let rules = nudeploy_rules::load_rules(&rules_path)
        .with_context(|| format!("Failed to load {}", rules_path.display()))?;

    let remapper = PathRemapper::new(rules, config.layout());
    let target = remapper.resolve(&args.file, &args.dir, &args.package_id, &args.package_version);

    match remapper.layout().to_app_path(&target) {
        Some(app_path) if !args.absolute => println!("{}", app_path),
        _ => println!("{}", target.display()),
    }
    Ok(0)
}
