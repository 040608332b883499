//! Rules command - validate and print the mapping rules.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

use nudeploy_rules::{MappingRules, RuleError};

#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Mapping rule document (defaults to the configured one)
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub format_json: bool,

    /// Application root
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,
}

pub fn execute(args: RulesArgs) -> Result<i32> {
    let config = crate::load_config(&args.working_dir, args.rules.as_deref())?;
    let path = config.rules_path()?;

    let rules = match MappingRules::load(&path) {
        Ok(rules) => rules,
        Err(e @ RuleError::Malformed { .. }) => {
            eprintln!("{} {}", style("Invalid:").red().bold(), e);
            return Ok(1);
        }
        Err(e) => return Err(e).context("Failed to read mapping rules"),
    };

    if args.format_json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(0);
    }

    if !path.exists() {
        println!(
            "{} {} does not exist, only the default layout applies",
            style("Info:").cyan(),
            path.display()
        );
        return Ok(0);
    }

    println!("{} ({} package rules)", path.display(), rules.len());
    for package in rules.packages() {
        println!("  {}", style(&package.id).cyan().bold());
        if package.paths.is_empty() {
            println!("    (no path mappings)");
        }
        for mapping in &package.paths {
            println!("    {} -> {}", mapping.from, mapping.to);
        }
    }
    Ok(0)
}
