//! Server configuration.
//!
//! Loaded once at startup from an optional YAML file (named by
//! `CAPSULE_CONFIG`) and then overridden by environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    /// Directory resources are served from
    pub content_root: PathBuf,
    pub tls: TlsConfig,
    /// Only requests naming this host are served, when set
    pub hostname: Option<String>,
    pub request_timeout_secs: u64,
    pub max_connections: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// PEM certificate chain
    pub cert_path: PathBuf,
    /// PEM private key
    pub key_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:1965".to_string(),
            content_root: PathBuf::from("content"),
            tls: TlsConfig::default(),
            hostname: None,
            request_timeout_secs: 10,
            max_connections: 1024,
        }
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: PathBuf::from(".ssl/server.crt"),
            key_path: PathBuf::from(".ssl/key.pem"),
        }
    }
}

impl Config {
    /// Reads `CAPSULE_CONFIG` (if set) and applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let cfg = match std::env::var_os("CAPSULE_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        cfg.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_yaml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Applies `LISTEN`, `CONTENT_ROOT`, `TLS_CERT`, `TLS_KEY` and
    /// `HOSTNAME_OVERRIDE` as returned by `lookup`.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("LISTEN") {
            self.listen_addr = addr;
        }
        if let Some(root) = lookup("CONTENT_ROOT") {
            self.content_root = PathBuf::from(root);
        }
        if let Some(cert) = lookup("TLS_CERT") {
            self.tls.cert_path = PathBuf::from(cert);
        }
        if let Some(key) = lookup("TLS_KEY") {
            self.tls.key_path = PathBuf::from(key);
        }
        if let Some(host) = lookup("HOSTNAME_OVERRIDE") {
            self.hostname = Some(host);
        }

        self.validate()?;
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.trim().is_empty() {
            return Err(ConfigError::Invalid("listen_addr is empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
