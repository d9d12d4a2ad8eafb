//! Get Top Keys Tool Handler
//!
//! Handles the get_top_keys MCP tool call over the statistics tracker.

use std::sync::Arc;

use rmcp::ErrorData as McpError;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use validator::Validate;

use opcache::OperationCache;

use crate::args::GetTopKeysArgs;
use crate::formatter::ResponseFormatter;

/// Handler for the most-accessed-keys report
pub struct GetTopKeysHandler {
    cache: Arc<OperationCache>,
}

impl GetTopKeysHandler {
    /// Create a new get_top_keys handler
    pub fn new(cache: Arc<OperationCache>) -> Self {
        Self { cache }
    }

    /// Handle the get_top_keys tool request
    pub async fn handle(
        &self,
        Parameters(args): Parameters<GetTopKeysArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = args.validate() {
            return Err(McpError::invalid_params(
                format!("Invalid arguments: {}", e),
                None,
            ));
        }

        let report = self.cache.top_keys(args.limit, args.group_by_operation);
        Ok(ResponseFormatter::format_top_keys(&report))
    }
}
