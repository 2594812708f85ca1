//! Configuration loading for the CLI

use anyhow::{Context, Result};
use arc_checker::CheckerConfig;
use std::path::Path;
use tracing::debug;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "arc-check.toml";

/// Load the checker configuration.
///
/// An explicit path must exist. Without one, `arc-check.toml` in the working
/// directory is used when present, otherwise the built-in defaults.
pub fn load(path: Option<&Path>) -> Result<CheckerConfig> {
    let path = match path {
        Some(path) => path,
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if !fallback.exists() {
                debug!("no configuration file, using defaults");
                return Ok(CheckerConfig::default());
            }
            fallback
        }
    };

    let config = CheckerConfig::from_file(path)
        .with_context(|| format!("Failed to load config file: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}
