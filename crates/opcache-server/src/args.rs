//! Tool argument types for the cache MCP server
//!
//! All MCP tool inputs are declared here so schema generation and request
//! validation stay in one place.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Arguments for the execute tool
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[schemars(description = "Parameters for executing an operation through the cache")]
pub struct ExecuteArgs {
    /// Registered operation to execute
    #[validate(length(min = 1, max = 100, message = "Operation name must be between 1 and 100 characters"))]
    #[validate(custom(function = "validate_operation_name", message = "Invalid operation name"))]
    #[schemars(description = "Name of a registered operation (e.g. 'echo', 'current_time')")]
    pub operation: String,
    /// Operation parameters, part of the cache key
    #[schemars(description = "Operation parameters as a JSON object; identical parameters share a cache entry")]
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Arguments for the get_key_info tool
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[schemars(description = "Parameters for inspecting one cache key")]
pub struct GetKeyInfoArgs {
    /// Full cache key to inspect
    #[validate(length(min = 1, max = 512, message = "Key must be between 1 and 512 characters"))]
    #[schemars(description = "Cache key to inspect, as produced by execute (operation:digest)")]
    pub key: String,
}

/// Arguments for the invalidate_pattern tool
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[schemars(description = "Parameters for deleting cache entries by pattern")]
pub struct InvalidatePatternArgs {
    /// Key pattern to delete, a literal key or a prefix ending in '*'
    #[validate(length(min = 1, max = 256, message = "Pattern must be between 1 and 256 characters"))]
    #[schemars(description = "Key pattern: a literal key or a prefix with one trailing '*' (e.g. 'balance:*')")]
    pub pattern: String,
    /// Must be true for the deletion to run
    #[schemars(description = "Safety gate; the call fails until this is set to true")]
    #[serde(default)]
    pub confirm: bool,
}

/// Arguments for the clear_all tool
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[schemars(description = "Parameters for clearing the entire cache")]
pub struct ClearAllArgs {
    /// Must be true for the clear to run
    #[schemars(description = "First safety gate; the call fails until this is set to true")]
    #[serde(default)]
    pub confirm: bool,
    /// Exact confirmation phrase
    #[schemars(description = "Second safety gate; must be exactly 'DELETE ALL CACHE DATA'")]
    #[serde(default)]
    pub confirm_phrase: String,
}

/// Arguments for the get_stats tool
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[schemars(description = "Parameters for reading cache statistics")]
pub struct GetStatsArgs {}

/// Arguments for the get_top_keys tool
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[schemars(description = "Parameters for listing the most-accessed cache keys")]
pub struct GetTopKeysArgs {
    /// Maximum number of keys to return (default: 10)
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    #[schemars(description = "Maximum number of keys or groups to return")]
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Roll counts up by operation prefix
    #[schemars(description = "When true, counts are grouped by the operation prefix before the digest")]
    #[serde(default)]
    pub group_by_operation: bool,
}

/// One entry to preload through the warm tool
///
/// `Serialize` is required: a batch-size violation embeds the offending
/// entries in the validation error.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WarmEntryArgs {
    /// Registered operation to execute
    #[schemars(description = "Name of a registered operation")]
    pub operation: String,
    /// Operation parameters, part of the cache key
    #[schemars(description = "Operation parameters as a JSON object")]
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Arguments for the warm tool
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[schemars(description = "Parameters for preloading cache entries")]
pub struct WarmArgs {
    /// Entries to preload
    #[validate(length(min = 1, max = 100, message = "Warm batch must contain between 1 and 100 entries"))]
    #[schemars(description = "Operations to execute and cache ahead of demand")]
    pub entries: Vec<WarmEntryArgs>,
}

fn default_limit() -> usize {
    10
}

// Custom validation functions

fn validate_operation_name(name: &str) -> Result<(), validator::ValidationError> {
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(validator::ValidationError::new(
            "Operation name may only contain letters, digits, '_' and '-'",
        ));
    }
    Ok(())
}
