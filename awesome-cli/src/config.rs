use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use awesome_orm::PoolConfig;
use tracing::debug;

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "awesome.toml";

/// Load `.env` from the current directory if present.
///
/// dotenvy doesn't overwrite variables that are already set, so the real
/// environment always wins.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded .env from {}", path.display()),
        Err(e) => debug!("No .env loaded: {}", e),
    }
}

/// Resolve the config path: explicit flag/env value, else `awesome.toml`
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Read the pool configuration, failing with an actionable message
pub fn load_pool_config(explicit: Option<&Path>) -> Result<PoolConfig> {
    let path = config_path(explicit);
    if !path.exists() {
        anyhow::bail!(
            "Config not found at {}\n\nCreate it with at least `user`, `password` and `db`, \
             or pass --config <FILE>",
            path.display()
        );
    }

    PoolConfig::load(&path).with_context(|| format!("Failed to load pool config {}", path.display()))
}
