#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for paygate
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (TOML)
//! - Environment variables (`PAYGATE_*`)

use paygate_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Gateway account configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URI every endpoint path is resolved against
    #[serde(default = "default_base_uri")]
    pub base_uri: String,
    /// Application identifier issued by the gateway
    #[serde(default)]
    pub app_id: String,
    /// Merchant identifier
    #[serde(default)]
    pub mch_id: String,
    /// Serial number of the certificate the private key belongs to
    #[serde(default)]
    pub serial_no: String,
    /// Path to the PKCS#8 PEM private key used by the asymmetric scheme
    pub key_path: Option<PathBuf>,
    /// Shared secret for the legacy signing scheme
    pub secret_key: Option<String>,
    /// Route every request through the sandbox environment
    #[serde(default)]
    pub sandbox: bool,
    /// Ask the gateway for verbose diagnostics on legacy requests
    #[serde(default)]
    pub debug: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_uri: default_base_uri(),
            app_id: String::new(),
            mch_id: String::new(),
            serial_no: String::new(),
            key_path: None,
            secret_key: None,
            sandbox: false,
            debug: false,
        }
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse as
    /// valid configuration.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::FileNotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Merge environment variable overrides into this configuration
    ///
    /// # Errors
    ///
    /// Returns an error if an override is present but not parseable.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(base_uri) = std::env::var("PAYGATE_BASE_URI") {
            self.gateway.base_uri = base_uri;
        }
        if let Ok(app_id) = std::env::var("PAYGATE_APP_ID") {
            self.gateway.app_id = app_id;
        }
        if let Ok(mch_id) = std::env::var("PAYGATE_MCH_ID") {
            self.gateway.mch_id = mch_id;
        }
        if let Ok(sandbox) = std::env::var("PAYGATE_SANDBOX") {
            self.gateway.sandbox = parse_bool("PAYGATE_SANDBOX", &sandbox)?;
        }
        if let Ok(debug) = std::env::var("PAYGATE_DEBUG") {
            self.gateway.debug = parse_bool("PAYGATE_DEBUG", &debug)?;
        }
        Ok(())
    }

    /// Validate that the fields the asymmetric scheme needs are present
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing field.
    pub fn validate_for_signing(&self) -> Result<(), Error> {
        if self.gateway.mch_id.is_empty() {
            return Err(ConfigError::MissingField {
                field: "gateway.mch_id".to_string(),
            }
            .into());
        }
        if self.gateway.serial_no.is_empty() {
            return Err(ConfigError::MissingField {
                field: "gateway.serial_no".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, Error> {
    match value {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("expected boolean, got {other:?}"),
        }
        .into()),
    }
}

fn default_base_uri() -> String {
    "https://api.mch.example.com/".to_string()
}

fn default_timeout() -> u64 {
    300 // 5 minutes, downloads included
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("paygate/{}", env!("CARGO_PKG_VERSION"))
}
