//! MCP Tool Handlers
//!
//! Implementations of MCP tool calls over the operation cache. Each handler
//! validates its arguments, calls into the cache, and renders the outcome
//! through the response formatter.

use rmcp::ErrorData as McpError;

pub mod clear_all;
pub mod execute;
pub mod get_key_info;
pub mod get_stats;
pub mod get_top_keys;
pub mod invalidate_pattern;
pub mod warm;

// Re-export handlers for convenience
pub use clear_all::ClearAllHandler;
pub use execute::ExecuteHandler;
pub use get_key_info::GetKeyInfoHandler;
pub use get_stats::GetStatsHandler;
pub use get_top_keys::GetTopKeysHandler;
pub use invalidate_pattern::InvalidatePatternHandler;
pub use warm::WarmHandler;

/// Translate a cache error into the matching MCP error code.
///
/// Guard violations and bad patterns are the caller's fault; everything
/// else is reported as an internal failure.
pub(crate) fn map_cache_error(error: opcache::Error) -> McpError {
    match &error {
        opcache::Error::ConfirmationRequired { .. }
        | opcache::Error::InvalidConfirmation { .. }
        | opcache::Error::InvalidPattern { .. } => {
            McpError::invalid_params(error.to_string(), None)
        }
        _ => McpError::internal_error(error.to_string(), None),
    }
}
