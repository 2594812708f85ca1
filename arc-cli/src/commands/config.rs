//! Configuration file commands

use anyhow::{Context, Result};
use arc_checker::CheckerConfig;
use colored::*;
use std::path::Path;
use tracing::info;

pub fn init_config_command(output: &Path) -> Result<()> {
    info!("Creating configuration file at {}", output.display());

    CheckerConfig::default()
        .to_file(output)
        .with_context(|| format!("Failed to write config file: {}", output.display()))?;

    println!("{} Wrote {}", "✓".green(), output.display());
    Ok(())
}

pub fn validate_config_command(path: &Path) -> Result<()> {
    info!("Validating configuration file {}", path.display());

    let config = CheckerConfig::from_file(path)?;
    config.validate()?;

    println!("{} {} is valid", "✓".green(), path.display());
    Ok(())
}
