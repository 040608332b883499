//! nudeploy - deploy NuGet packages into a web application.

mod install;
mod resolve;
mod rules;
mod uninstall;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};

use nudeploy_pm::DeployConfig;

use install::InstallArgs;
use resolve::ResolveArgs;
use rules::RulesArgs;
use uninstall::UninstallArgs;

#[derive(Parser, Debug)]
#[command(name = "nudeploy", version, about = "Deploy NuGet packages into a web application")]
struct Cli {
    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install package archives and deploy their files
    Install(InstallArgs),

    /// Remove a package from the local repository
    Uninstall(UninstallArgs),

    /// Show where a content file of a package would be deployed
    Resolve(ResolveArgs),

    /// Validate and show the mapping rules
    Rules(RulesArgs),
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Install(args) => install::execute(args),
        Commands::Uninstall(args) => uninstall::execute(args),
        Commands::Resolve(args) => resolve::execute(args),
        Commands::Rules(args) => rules::execute(args),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Load the configuration of the application in `working_dir`, with an
/// optional rule document overriding the configured one.
pub(crate) fn load_config(working_dir: &Path, rules: Option<&Path>) -> Result<DeployConfig> {
    let working_dir = working_dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve working directory {}", working_dir.display()))?;

    let mut config = DeployConfig::load(&working_dir).context("Failed to load configuration")?;
    if let Some(rules) = rules {
        let rules: PathBuf = std::path::absolute(rules)
            .with_context(|| format!("Failed to resolve {}", rules.display()))?;
        config.rules_file = rules.to_string_lossy().into_owned();
    }
    Ok(config)
}
