//! Configuration loading and validation
//!
//! Configuration merges three layers with Figment (later layers override
//! earlier): defaults from `AppConfig::default()`, an optional TOML file,
//! and `OPCACHE_`-prefixed environment variables.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{Error, Result};
use crate::logging::{log_config_loaded, parse_log_level};
use crate::ttl::TtlPolicy;

/// Store backends the cache can run against
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store (Moka), for development and cache-local deployments
    Memory,
    /// Distributed store (Redis)
    Redis,
}

/// One TTL rule as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlRuleConfig {
    /// Key pattern, literal or with one trailing `*`
    pub pattern: String,

    /// TTL in seconds for keys matching the pattern
    pub ttl_secs: u64,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache enabled; when false, operations execute directly and nothing
    /// is stored or counted
    pub enabled: bool,

    /// Store backend
    pub backend: StoreBackend,

    /// Default TTL in seconds when no rule matches
    pub default_ttl_secs: u64,

    /// Ordered TTL rules; specificity decides precedence, not file order
    pub ttl_rules: Vec<TtlRuleConfig>,

    /// Redis URL (for the Redis backend)
    pub redis_url: Option<String>,

    /// Namespace for keys in a shared backing store
    pub namespace: String,

    /// Maximum entries held by the memory backend
    pub max_entries: u64,

    /// Cap on the per-key access counter set
    pub stats_key_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: StoreBackend::Memory,
            default_ttl_secs: CACHE_DEFAULT_TTL_SECS,
            ttl_rules: Vec::new(),
            redis_url: None,
            namespace: CACHE_DEFAULT_NAMESPACE.to_string(),
            max_entries: CACHE_DEFAULT_MAX_ENTRIES,
            stats_key_capacity: STATS_KEY_CAPACITY,
        }
    }
}

impl CacheConfig {
    /// Compile the configured TTL rules into an immutable policy
    pub fn ttl_policy(&self) -> Result<TtlPolicy> {
        let rules = self
            .ttl_rules
            .iter()
            .map(|rule| (rule.pattern.clone(), Duration::from_secs(rule.ttl_secs)))
            .collect();
        TtlPolicy::new(rules, Duration::from_secs(self.default_ttl_secs))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON output format
    pub json_format: bool,

    /// Log to file in addition to stderr
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file_output: None,
        }
    }
}

/// Server identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server name advertised to clients
    pub name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "opcache-server".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server identity
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Cache configuration
    pub cache: CacheConfig,
}

/// Configuration loader service
#[derive(Clone)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources
    ///
    /// Sources merge in this order (later sources override earlier):
    /// 1. Default values from `AppConfig::default()`
    /// 2. TOML configuration file (if it exists)
    /// 3. Prefixed environment variables, `__` separating sections
    ///    (e.g. `OPCACHE_CACHE__DEFAULT_TTL_SECS`)
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if let Some(config_path) = &self.config_path {
            if config_path.exists() {
                figment = figment.merge(Toml::file(config_path));
                log_config_loaded(config_path, true);
            } else {
                log_config_loaded(config_path, false);
            }
        } else if let Some(default_path) = Self::find_default_config_path() {
            figment = figment.merge(Toml::file(&default_path));
            log_config_loaded(&default_path, true);
        }

        // Double underscore as the section separator so field names may
        // themselves contain underscores.
        figment = figment.merge(Env::prefixed(&format!("{}_", self.env_prefix)).split("__"));

        let app_config: AppConfig = figment
            .extract()
            .map_err(|e| Error::configuration_with_source("Failed to extract configuration", e))?;

        validate_app_config(&app_config)?;

        Ok(app_config)
    }

    /// Find a default configuration file next to the process
    fn find_default_config_path() -> Option<PathBuf> {
        let current_dir = env::current_dir().ok()?;
        let candidates = [
            current_dir.join(DEFAULT_CONFIG_FILENAME),
            current_dir
                .join(DEFAULT_CONFIG_DIR)
                .join(DEFAULT_CONFIG_FILENAME),
        ];
        candidates.into_iter().find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate application configuration
///
/// Performs validation of all configuration sections.
pub fn validate_app_config(config: &AppConfig) -> Result<()> {
    validate_server_config(config)?;
    validate_logging_config(config)?;
    validate_cache_config(config)?;
    Ok(())
}

fn validate_server_config(config: &AppConfig) -> Result<()> {
    if config.server.name.trim().is_empty() {
        return Err(Error::configuration("Server name cannot be empty"));
    }
    Ok(())
}

fn validate_logging_config(config: &AppConfig) -> Result<()> {
    parse_log_level(&config.logging.level)?;
    Ok(())
}

fn validate_cache_config(config: &AppConfig) -> Result<()> {
    let cache = &config.cache;
    if cache.enabled && cache.default_ttl_secs == 0 {
        return Err(Error::configuration(
            "Cache TTL cannot be 0 when cache is enabled",
        ));
    }
    for rule in &cache.ttl_rules {
        if rule.ttl_secs == 0 {
            return Err(Error::configuration(format!(
                "TTL rule '{}' cannot have a TTL of 0",
                rule.pattern
            )));
        }
    }
    // Compiling the policy surfaces malformed or duplicate rule patterns.
    cache.ttl_policy()?;

    if cache.backend == StoreBackend::Redis
        && cache.redis_url.as_deref().is_none_or(str::is_empty)
    {
        return Err(Error::configuration(
            "Redis URL is required when the redis backend is selected",
        ));
    }
    if cache.namespace.is_empty()
        || !cache
            .namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::configuration(
            "Cache namespace must be non-empty and contain only alphanumerics, '-' or '_'",
        ));
    }
    if cache.max_entries == 0 {
        return Err(Error::configuration("Cache max entries cannot be 0"));
    }
    if cache.stats_key_capacity == 0 {
        return Err(Error::configuration("Stats key capacity cannot be 0"));
    }
    Ok(())
}

/// Configuration builder for programmatic configuration
pub struct ConfigBuilder {
    config: AppConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder with defaults
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Set server configuration
    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Set logging configuration
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Set cache configuration
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.config.cache = cache;
        self
    }

    /// Build the configuration
    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
