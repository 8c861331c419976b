//! Configuration loading for the binary.

use anyhow::{Context, Result};
use std::path::Path;

pub use vl_core::config::Config;

/// Locations searched when no config path is given.
const DEFAULT_PATHS: &[&str] = &[
    "./config.toml",
    "./videoladder.toml",
    "/etc/videoladder/config.toml",
];

/// Load configuration from a file and apply environment overrides.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = Config::from_file(path)
        .with_context(|| format!("Failed to load config file: {}", path.display()))?;
    config.apply_env_overrides();

    for warning in config.validate() {
        tracing::warn!("Config: {}", warning);
    }

    Ok(config)
}

/// Load config from `custom_path`, the default locations, or defaults.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    config.apply_env_overrides();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config_or_default(Some(&missing)).is_err());
    }

    #[test]
    fn explicit_toml_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("videoladder.toml");
        std::fs::write(
            &path,
            "[processing]\nmax_parallel_renditions = 3\n\n[storage.disks]\nmedia = \"/srv/media\"\n",
        )
        .unwrap();

        let config = load_config_or_default(Some(&path)).unwrap();
        assert_eq!(config.processing.max_parallel_renditions, 3);
        assert!(config.storage.disks.contains_key("media"));
    }
}
