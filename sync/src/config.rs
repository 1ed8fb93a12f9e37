use core::fmt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which side owns the mine layout and the cascade.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    #[default]
    ClientAuthoritative,
    ServerAuthoritative,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ClientAuthoritative => "client-authoritative",
            Self::ServerAuthoritative => "server-authoritative",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root of the session store, without a trailing `/api`.
    pub base_url: String,
    pub mode: SyncMode,
    pub request_timeout_ms: u64,
    /// Extra attempts for reads that failed in transit. Writes are never repeated.
    pub max_read_retries: u32,
    /// Force a seed instead of random
    pub seed: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            mode: SyncMode::default(),
            request_timeout_ms: 10_000,
            max_read_retries: 2,
            seed: None,
        }
    }
}

impl SyncConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        log::debug!("Loaded sync config from {}", path.display());
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = SyncConfig::from_toml_str("").unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.max_read_retries, 2);
    }

    #[test]
    fn reads_every_field() {
        let config = SyncConfig::from_toml_str(
            r#"
            base_url = "https://mines.example"
            mode = "server_authoritative"
            request_timeout_ms = 2500
            max_read_retries = 0
            seed = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url, "https://mines.example");
        assert_eq!(config.mode, SyncMode::ServerAuthoritative);
        assert_eq!(config.request_timeout(), Duration::from_millis(2500));
        assert_eq!(config.max_read_retries, 0);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = SyncConfig::from_toml_str(r#"mode = "peer_to_peer""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SyncConfig::load("/nonexistent/sapper.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
