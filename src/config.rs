//! Top-level application configuration.
//!
//! Configuration is stored in `.directory/config.yaml` and includes:
//! - The Directory API base URL
//! - Paging and prefetch settings for list views
//! - The API token used for authenticated lists

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DirectoryError, Result};
use crate::paths::directory_root;

/// Environment variable overriding `api_url`.
pub const API_URL_ENV: &str = "DIRECTORY_API_URL";

/// Environment variable overriding `auth.token`.
pub const TOKEN_ENV: &str = "DIRECTORY_TOKEN";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Directory API (e.g. `https://api.example.org/v1`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Items requested per page (default: 20)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Distance before the end of a list at which the next page is requested
    /// (default: 900)
    #[serde(default = "default_prefetch_margin")]
    pub prefetch_margin: u32,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Authentication
    #[serde(default, skip_serializing_if = "AuthConfig::is_empty")]
    pub auth: AuthConfig,
}

fn default_page_size() -> u32 {
    20
}

fn default_prefetch_margin() -> u32 {
    900
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            page_size: default_page_size(),
            prefetch_margin: default_prefetch_margin(),
            request_timeout: default_request_timeout(),
            auth: AuthConfig::default(),
        }
    }
}

/// Authentication configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl AuthConfig {
    pub fn is_empty(&self) -> bool {
        self.token.is_none()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        directory_root().join("config.yaml")
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            DirectoryError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DirectoryError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content).map_err(|e| {
            DirectoryError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {}", path.display(), e),
            ))
        })?;

        // The file may hold the API token: owner read/write only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(DirectoryError::Config(
                "page_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// API base URL from the environment or the config file
    pub fn api_url(&self) -> Result<Url> {
        if let Ok(url) = env::var(API_URL_ENV)
            && !url.is_empty()
        {
            return Ok(Url::parse(&url)?);
        }

        match &self.api_url {
            Some(url) => Ok(Url::parse(url)?),
            None => Err(DirectoryError::Config(format!(
                "no API URL configured. Set {API_URL_ENV} or run `directory config set api_url <url>`"
            ))),
        }
    }

    /// API token from the environment or the config file
    pub fn token(&self) -> Option<SecretString> {
        if let Ok(token) = env::var(TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(SecretString::from(token));
        }

        self.auth.token.clone().map(SecretString::from)
    }

    /// Get the request timeout duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Set a value by its dotted key.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api_url" => {
                Url::parse(value)?;
                self.api_url = Some(value.to_string());
            }
            "page_size" => self.page_size = parse_number(key, value)?,
            "prefetch_margin" => self.prefetch_margin = parse_number(key, value)?,
            "request_timeout" => self.request_timeout = parse_number(key, value)?,
            "auth.token" => self.auth.token = Some(value.to_string()),
            _ => {
                return Err(DirectoryError::Config(format!(
                    "unknown config key '{key}'. Valid keys: {}",
                    CONFIG_KEYS.join(", ")
                )));
            }
        }
        self.validate()
    }
}

/// Keys accepted by [`Config::set_value`].
pub const CONFIG_KEYS: [&str; 5] = [
    "api_url",
    "page_size",
    "prefetch_margin",
    "request_timeout",
    "auth.token",
];

fn parse_number<N: std::str::FromStr>(key: &str, value: &str) -> Result<N> {
    value
        .trim()
        .parse()
        .map_err(|_| DirectoryError::Config(format!("invalid value '{value}' for {key}")))
}
