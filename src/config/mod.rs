pub use af_core::config::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./assetforge.toml",
        "~/.config/assetforge/config.toml",
        "/etc/assetforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// The file datastore root with `~` and environment variables expanded.
pub fn datastore_root(config: &DatastoreConfig) -> Result<PathBuf> {
    let raw = config.root.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand datastore root: {raw}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Reject configurations the app cannot start with; log the rest.
fn validate_config(config: &Config) -> Result<()> {
    if config.datastore.backend == DatastoreBackend::File {
        let root = datastore_root(&config.datastore)?;
        if root.exists() && !root.is_dir() {
            anyhow::bail!("Datastore root is not a directory: {:?}", root);
        }
    }

    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    Ok(())
}
