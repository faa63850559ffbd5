//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The client secret is resolved from the TOKENFLIGHT_CLIENT_SECRET env
//! var or client_secret_file, never stored in the TOML directly to avoid
//! leaking secrets.

use common::Secret;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Refresh exchange endpoint settings
#[derive(Debug, Deserialize)]
pub struct ExchangeConfig {
    pub token_endpoint: String,
    pub client_id: String,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// Path to a file containing the client secret (alternative to the
    /// TOKENFLIGHT_CLIENT_SECRET env var)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
}

/// Outbound request settings
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Credential persistence settings
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsConfig {
    /// File-backed credential store when set, in-memory otherwise
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_timeout() -> u64 {
    60
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment
    /// variables.
    ///
    /// Client secret resolution order:
    /// 1. TOKENFLIGHT_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        // Validate token_endpoint is a valid URL with http(s) scheme
        if !config.exchange.token_endpoint.starts_with("http://")
            && !config.exchange.token_endpoint.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "token_endpoint must start with http:// or https://, got: {}",
                config.exchange.token_endpoint
            )));
        }

        if config.exchange.client_id.is_empty() {
            return Err(common::Error::Config("client_id must not be empty".into()));
        }

        if config.client.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        // Resolve client secret: env var takes precedence over file
        if let Ok(secret) = std::env::var("TOKENFLIGHT_CLIENT_SECRET") {
            let secret = secret.trim();
            if !secret.is_empty() {
                config.exchange.client_secret = Some(Secret::new(secret.to_owned()));
            }
        } else if let Some(ref secret_file) = config.exchange.client_secret_file {
            config.exchange.client_secret = Secret::from_file(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("tokenflight.toml")
    }
}
