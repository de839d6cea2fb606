//! # Configuration
//!
//! Settings are layered, later layers winning:
//!
//! 1. built-in defaults
//! 2. `inkcard.toml` (or the file passed with `--config`)
//! 3. environment variables
//! 4. CLI flags (applied by the `cli` module)
//!
//! ## Environment Variables
//!
//! - `INKCARD_SITE_BASE`: public base URL used in share links
//! - `INKCARD_RATE_LIMIT`: requests per second (0 disables limiting)
//! - `INKCARD_CORS_ORIGINS`: comma-separated origins, or "*" for all
//! - `INKCARD_STORE_TIMEOUT_MS`: per-call store timeout

use inkcard_core::ViewLedger;
use inkcard_core::primitives::DEFAULT_VIEW_WINDOW_MS;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "inkcard.toml";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

// =============================================================================
// SECTIONS
// =============================================================================

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public base URL of card pages, e.g. `https://cards.example.com`.
    pub site_base: String,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Comma-separated allowed origins, or "*". `None` means localhost only.
    pub cors_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            site_base: "http://localhost:8080".to_string(),
            rate_limit: 100,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    /// `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Path of the redb database file.
    pub path: PathBuf,
    /// Timeout applied to every store call.
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("inkcard.redb"),
            timeout_ms: 2_000,
        }
    }
}

/// `[ledger]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Dedup window for repeat views, in seconds.
    pub window_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_VIEW_WINDOW_MS / 1_000,
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Full application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub ledger: LedgerConfig,
}

impl Config {
    /// Load defaults, then the config file, then the environment.
    ///
    /// An explicit `path` must exist. Without one, `inkcard.toml` is read if
    /// present in the working directory.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Parse TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(base) = lookup("INKCARD_SITE_BASE") {
            self.server.site_base = base;
        }
        if let Some(origins) = lookup("INKCARD_CORS_ORIGINS") {
            self.server.cors_origins = Some(origins);
        }
        if let Some(value) = lookup("INKCARD_RATE_LIMIT") {
            self.server.rate_limit = parse_number("INKCARD_RATE_LIMIT", &value)?;
        }
        if let Some(value) = lookup("INKCARD_STORE_TIMEOUT_MS") {
            self.store.timeout_ms = parse_number("INKCARD_STORE_TIMEOUT_MS", &value)?;
        }
        Ok(())
    }

    /// Store call timeout.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store.timeout_ms)
    }

    /// View ledger with the configured dedup window.
    pub fn ledger(&self) -> ViewLedger {
        ViewLedger::new(self.ledger.window_secs.saturating_mul(1_000))
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}

// =============================================================================
// TESTS
// =============================================================================
