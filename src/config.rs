//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::provider::Endpoints;
use crate::query::{Dialect, FieldPolicy};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-site credentials, keyed by site id
    #[serde(default)]
    pub sites: BTreeMap<String, SiteConfig>,
}

/// Provider and translation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub dialect: Dialect,

    /// Fail on fields the dialect cannot express instead of dropping them
    #[serde(default = "default_strict")]
    pub strict: bool,

    #[serde(default)]
    pub endpoints: Endpoints,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Bearer token served by the static token provider
    pub access_token: Option<SecretString>,
}

fn default_strict() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            strict: default_strict(),
            endpoints: Endpoints::default(),
            request_timeout_secs: default_request_timeout(),
            access_token: None,
        }
    }
}

impl ProviderConfig {
    pub fn field_policy(&self) -> FieldPolicy {
        if self.strict {
            FieldPolicy::Strict
        } else {
            FieldPolicy::Lenient
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Client cache configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    /// Rebuild a site's client once it is older than this; never when unset
    pub max_age_secs: Option<u64>,
}

impl CacheConfig {
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age_secs.map(Duration::from_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Credential source for one site
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Path to a service-account JSON key
    pub key_file: Option<PathBuf>,

    /// Environment variable holding the service-account JSON key
    pub key_env: Option<String>,
}

/// Environment variable naming the config file for [`Config::load_default`]
pub const CONFIG_PATH_VAR: &str = "SITE_ANALYTICS_CONFIG";

fn default_application_name() -> String {
    "site-analytics".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load the first readable config file, then apply environment overrides.
    ///
    /// `SITE_ANALYTICS_CONFIG` names the file outright; otherwise the user
    /// config dir, `/etc/site-analytics` and `./site-analytics.toml` are tried.
    pub fn load_default() -> Self {
        let paths = Self::candidate_paths(|key| std::env::var(key).ok());
        let mut config = Self::load_first(&paths).unwrap_or_else(|| {
            tracing::info!("Using default config with environment overrides");
            Config::default()
        });
        config.apply_env_overrides();
        config
    }

    fn candidate_paths(lookup: impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
        if let Some(path) = lookup(CONFIG_PATH_VAR).filter(|p| !p.trim().is_empty()) {
            return vec![PathBuf::from(path)];
        }

        let mut paths: Vec<PathBuf> = dirs::config_dir()
            .map(|p| p.join("site-analytics").join("config.toml"))
            .into_iter()
            .collect();
        paths.push(PathBuf::from("/etc/site-analytics/config.toml"));
        paths.push(PathBuf::from("site-analytics.toml"));
        paths
    }

    fn load_first(paths: &[PathBuf]) -> Option<Self> {
        for path in paths {
            if !path.exists() {
                tracing::debug!(path = ?path, "No config file");
                continue;
            }
            match Self::load(path) {
                Ok(config) => {
                    tracing::info!(path = ?path, "Loaded config");
                    return Some(config);
                }
                Err(e) => tracing::warn!(error = %e, "Skipping config file"),
            }
        }
        None
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Provider overrides
        if let Some(name) = lookup("SITE_ANALYTICS_DIALECT") {
            match Dialect::parse(&name) {
                Some(dialect) => self.provider.dialect = dialect,
                None => tracing::warn!("Ignoring unknown dialect {:?}", name),
            }
        }
        if let Some(token) = lookup("SITE_ANALYTICS_ACCESS_TOKEN") {
            self.provider.access_token = Some(SecretString::new(token));
        }
        if let Some(strict) = lookup("SITE_ANALYTICS_STRICT") {
            if let Ok(s) = strict.parse() {
                self.provider.strict = s;
            }
        }

        // Logging overrides
        if let Some(level) = lookup("SITE_ANALYTICS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SITE_ANALYTICS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Site Analytics Configuration
#
# Searched for in $SITE_ANALYTICS_CONFIG, then the user config dir,
# /etc/site-analytics/config.toml and ./site-analytics.toml.
#
# Environment variables override these settings:
# - SITE_ANALYTICS_DIALECT
# - SITE_ANALYTICS_ACCESS_TOKEN
# - SITE_ANALYTICS_STRICT
# - SITE_ANALYTICS_LOG_LEVEL
# - SITE_ANALYTICS_LOG_FORMAT

[provider]
# Reporting API generation: core_reporting_v3, reporting_v4 or data_v1beta
dialect = "data_v1beta"

# Fail on fields the dialect cannot express (segment, filters expression,
# page token). When false they are dropped with a warning.
strict = true

# Request timeout in seconds
request_timeout_secs = 30

# Bearer token sent with every request
# access_token = ""

[provider.endpoints]
core_reporting = "https://www.googleapis.com/analytics/v3/data/ga"
reporting_v4 = "https://analyticsreporting.googleapis.com/v4/reports:batchGet"
data_api = "https://analyticsdata.googleapis.com/v1beta"

[cache]
# Rebuild a site's client after this many seconds (never when unset)
# max_age_secs = 3600

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# One table per site
# [sites.example]
# application_name = "Example Site"
# key_file = "/etc/site-analytics/keys/example.json"
# key_env = "EXAMPLE_ANALYTICS_KEY"
"#
    .to_string()
}
