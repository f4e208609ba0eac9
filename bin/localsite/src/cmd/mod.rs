//! Command implementations.

pub mod build;
pub mod rewrite;
pub mod serve;

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use localsite_core::Config;

/// Load the configuration, layering `LOCALSITE__*` environment overrides.
pub fn load_config(config_path: &Path) -> Result<Config> {
    let config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

/// Directory pages are written to and read from.
#[must_use]
pub fn site_root(config: &Config, root: &Path) -> PathBuf {
    root.join(&config.build.output_dir)
}
