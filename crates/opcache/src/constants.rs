//! Shared constants for configuration and administrative guards

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "opcache.toml";

/// Directory checked for the default configuration file
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for configuration overrides
pub const CONFIG_ENV_PREFIX: &str = "OPCACHE";

/// Environment variable consulted for log filter directives
pub const LOG_ENV_VAR: &str = "OPCACHE_LOG";

/// Default TTL in seconds applied when no rule matches
pub const CACHE_DEFAULT_TTL_SECS: u64 = 3600;

/// Default capacity of the in-process store (entries)
pub const CACHE_DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Default namespace prefixed to keys in a shared backing store
pub const CACHE_DEFAULT_NAMESPACE: &str = "opcache";

/// Default cap on the per-key access counter set
pub const STATS_KEY_CAPACITY: u64 = 4096;

/// Number of hot keys included in a statistics snapshot
pub const SNAPSHOT_TOP_KEYS: usize = 10;

/// Exact phrase required to clear the entire cache
pub const CLEAR_ALL_CONFIRM_PHRASE: &str = "DELETE ALL CACHE DATA";

/// Timeout for acquiring a backing store connection
pub const STORE_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Page size used when enumerating keys from the backing store
pub const STORE_SCAN_PAGE_SIZE: usize = 200;
