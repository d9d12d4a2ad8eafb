//! Clear All Tool Handler
//!
//! Handles the clear_all MCP tool call. Both gates, the boolean and the
//! exact phrase, are enforced by the cache library before anything is
//! deleted.

use std::sync::Arc;

use rmcp::ErrorData as McpError;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use validator::Validate;

use opcache::OperationCache;

use crate::args::ClearAllArgs;
use crate::formatter::ResponseFormatter;
use crate::handlers::map_cache_error;

/// Handler for clearing the entire cache
pub struct ClearAllHandler {
    cache: Arc<OperationCache>,
}

impl ClearAllHandler {
    /// Create a new clear_all handler
    pub fn new(cache: Arc<OperationCache>) -> Self {
        Self { cache }
    }

    /// Handle the clear_all tool request
    pub async fn handle(
        &self,
        Parameters(args): Parameters<ClearAllArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = args.validate() {
            return Err(McpError::invalid_params(
                format!("Invalid arguments: {}", e),
                None,
            ));
        }

        let count = self
            .cache
            .clear_all(args.confirm, &args.confirm_phrase)
            .await
            .map_err(map_cache_error)?;
        Ok(ResponseFormatter::format_clear_all(count))
    }
}
