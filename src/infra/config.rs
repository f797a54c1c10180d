//! Configuration management infrastructure.
//!
//! Gateway endpoints, protocol constants and credential locations are carried
//! in an explicit [`GatewayConfig`] handed to the client at construction. The
//! PKCS#12 password is read from the environment, never from the file.

use crate::infra::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the merchant PKCS#12 password.
pub const PFX_PASSWORD_ENV: &str = "UNIONPAY_PFX_PASSWORD";

const SANDBOX_GATEWAY: &str = "https://gateway.test.95516.com";
const PRODUCTION_GATEWAY: &str = "https://gateway.95516.com";

/// Gateway environment selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    #[must_use]
    pub fn gateway_host(&self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_GATEWAY,
            Environment::Production => PRODUCTION_GATEWAY,
        }
    }
}

/// Client configuration with all gateway preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Sandbox or production gateway
    pub environment: Environment,

    /// Overrides the environment's gateway host (scheme + authority)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_host: Option<String>,

    /// Merchant number assigned by the acquirer
    pub merchant_id: String,

    /// Protocol version sent as `version`
    pub version: String,

    /// Signature method code sent as `signMethod`
    pub sign_method: String,

    /// Character encoding sent as `encoding`
    pub encoding: String,

    /// HTTP timeout for gateway calls
    pub network_timeout_seconds: u64,

    /// Credential file locations
    pub credentials: CredentialPaths,
}

/// Locations of the key container and trust anchors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialPaths {
    /// Merchant PKCS#12 signing container
    pub signing_pfx: Option<PathBuf>,

    /// Gateway root certificate
    pub root_cert: Option<PathBuf>,

    /// Gateway intermediate certificate
    pub intermediate_cert: Option<PathBuf>,

    /// Sensitive-information encryption certificate, if loaded from disk
    pub encryption_cert: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Sandbox,
            gateway_host: None,
            merchant_id: String::new(),
            version: "5.1.0".to_string(),
            sign_method: "01".to_string(),
            encoding: "UTF-8".to_string(),
            network_timeout_seconds: 30,
            credentials: CredentialPaths::default(),
        }
    }
}

impl GatewayConfig {
    /// Sandbox configuration for the given merchant
    #[must_use]
    pub fn sandbox(merchant_id: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            ..Self::default()
        }
    }

    /// Production configuration for the given merchant
    #[must_use]
    pub fn production(merchant_id: impl Into<String>) -> Self {
        Self {
            environment: Environment::Production,
            merchant_id: merchant_id.into(),
            ..Self::default()
        }
    }

    /// Effective gateway host
    #[must_use]
    pub fn host(&self) -> &str {
        self.gateway_host
            .as_deref()
            .unwrap_or_else(|| self.environment.gateway_host())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.network_timeout_seconds)
    }

    /// Validate configuration values
    pub fn validate(&self) -> GatewayResult<()> {
        if self.merchant_id.is_empty() {
            return Err(GatewayError::Configuration(
                "merchant_id must not be empty".to_string(),
            ));
        }
        if !self.merchant_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(GatewayError::Configuration(format!(
                "merchant_id must be alphanumeric: {}",
                self.merchant_id
            )));
        }
        if self.version.is_empty() || self.sign_method.is_empty() || self.encoding.is_empty() {
            return Err(GatewayError::Configuration(
                "version, sign_method and encoding must be set".to_string(),
            ));
        }
        if let Some(host) = &self.gateway_host {
            if !host.starts_with("https://") && !host.starts_with("http://") {
                return Err(GatewayError::Configuration(format!(
                    "Gateway host must start with http:// or https://, got: {host}"
                )));
            }
        }
        if self.network_timeout_seconds == 0 {
            return Err(GatewayError::Configuration(
                "Network timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Read the PKCS#12 password from the environment
    pub fn pfx_password_from_env() -> GatewayResult<String> {
        std::env::var(PFX_PASSWORD_ENV).map_err(|_| {
            GatewayError::Configuration(format!("{PFX_PASSWORD_ENV} environment variable not set"))
        })
    }
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    pub fn new() -> GatewayResult<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> GatewayResult<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("unionpay-gateway").join("config.toml"))
        } else {
            Ok(PathBuf::from("unionpay-gateway.toml"))
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create_default(&self) -> GatewayResult<GatewayConfig> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::info!(
                "Configuration file not found, creating default: {}",
                self.config_path.display()
            );
            let default_config = GatewayConfig::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }

    /// Load and validate configuration from file
    pub fn load(&self) -> GatewayResult<GatewayConfig> {
        log::info!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            GatewayError::Configuration(format!(
                "Failed to read config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        let config: GatewayConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &GatewayConfig) -> GatewayResult<()> {
        log::info!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    GatewayError::Configuration(format!(
                        "Failed to create config directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).map_err(|e| {
            GatewayError::Configuration(format!(
                "Failed to write config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;
        Ok(())
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
