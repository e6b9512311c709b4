//! Loopback configuration.
//!
//! Stored as TOML, by default at `~/.config/bleft/loopback.toml`.

use std::path::{Path, PathBuf};

use bleft_transfer::TransferConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Endpoint that offers the file for upload.
    #[serde(default = "default_device")]
    pub device: TransferConfig,

    /// Endpoint that downloads it.
    #[serde(default = "default_controller")]
    pub controller: TransferConfig,
}

fn data_root() -> PathBuf {
    TransferConfig::default().root_path
}

fn default_device() -> TransferConfig {
    TransferConfig::with_root(data_root().join("device"))
}

fn default_controller() -> TransferConfig {
    TransferConfig::with_root(data_root().join("controller"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: default_device(),
            controller: default_controller(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, writing the defaults there if absent.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home)
        .join(".config")
        .join("bleft")
        .join("loopback.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roots_differ() {
        let config = Config::default();
        assert_ne!(config.device.root_path, config.controller.root_path);
        assert_eq!(config.device.mtu, 185);
    }

    #[test]
    fn load_creates_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("loopback.toml");

        let config = Config::load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loopback.toml");
        std::fs::write(&path, "[device]\nmtu = 247\nroot_path = \"/srv/dev\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.device.mtu, 247);
        assert_eq!(config.device.root_path, PathBuf::from("/srv/dev"));
        assert_eq!(config.device.super_chunk_size, 100 * 1024);
        assert_eq!(config.controller, default_controller());
    }

    #[test]
    fn default_path_is_under_config_dir() {
        let path = default_config_path();
        assert!(path.ends_with(".config/bleft/loopback.toml"));
    }
}
