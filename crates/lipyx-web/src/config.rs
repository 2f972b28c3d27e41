//! Configuration loading for the Lipyx server.
//! Reads lipyx.toml from the current directory or the path in LIPYX_CONFIG.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use lipyx_molecules::{DepictOptions, FingerprintParams};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const CONFIG_ENV: &str = "LIPYX_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "lipyx.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
    /// Map error payloads to 4xx/5xx instead of always answering 200.
    #[serde(default)]
    pub strict_status: bool,
    #[serde(default)]
    pub fingerprint: FingerprintParams,
    #[serde(default)]
    pub render: DepictOptions,
}

fn default_bind()        -> SocketAddr { SocketAddr::from(([127, 0, 0, 1], 5000)) }
fn default_model_path()  -> PathBuf    { PathBuf::from("lipophilicity_model.safetensors") }
fn default_images_dir()  -> PathBuf    { PathBuf::from("images") }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            model_path: default_model_path(),
            images_dir: default_images_dir(),
            strict_status: false,
            fingerprint: FingerprintParams::default(),
            render: DepictOptions::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration.
    /// A path in LIPYX_CONFIG must exist; without it, lipyx.toml is read if
    /// present and the built-in defaults are used otherwise.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path),
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            Err(_) => {
                info!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind.port(), 5000);
        assert_eq!(config.fingerprint.nbits, 2048);
        assert_eq!(config.fingerprint.radius, 2);
        assert_eq!((config.render.width, config.render.height), (300, 300));
        assert!(!config.strict_status);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ServerConfig::from_toml_str(
            r#"
            bind = "0.0.0.0:8080"
            strict_status = true

            [fingerprint]
            nbits = 1024

            [render]
            width = 400
            "#,
        )
        .unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert!(config.strict_status);
        assert_eq!(config.fingerprint.nbits, 1024);
        assert_eq!(config.fingerprint.radius, 2);
        assert_eq!((config.render.width, config.render.height), (400, 300));
        assert_eq!(config.model_path, PathBuf::from("lipophilicity_model.safetensors"));
    }

    #[test]
    fn malformed_file_is_rejected() {
        assert!(ServerConfig::from_toml_str("bind = 12").is_err());
        assert!(ServerConfig::from_toml_str("[fingerprint").is_err());
    }

    #[test]
    fn named_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ServerConfig::from_file(dir.path().join("missing.toml")).is_err());

        let path = dir.path().join("lipyx.toml");
        std::fs::write(&path, "images_dir = \"/tmp/lipyx-images\"\n").unwrap();
        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.images_dir, PathBuf::from("/tmp/lipyx-images"));
    }
}
