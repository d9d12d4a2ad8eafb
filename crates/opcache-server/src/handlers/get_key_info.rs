//! Get Key Info Tool Handler
//!
//! Handles the get_key_info MCP tool call against the entry store.

use std::sync::Arc;

use rmcp::ErrorData as McpError;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use validator::Validate;

use opcache::OperationCache;

use crate::args::GetKeyInfoArgs;
use crate::formatter::ResponseFormatter;
use crate::handlers::map_cache_error;

/// Handler for cache key inspection
pub struct GetKeyInfoHandler {
    cache: Arc<OperationCache>,
}

impl GetKeyInfoHandler {
    /// Create a new get_key_info handler
    pub fn new(cache: Arc<OperationCache>) -> Self {
        Self { cache }
    }

    /// Handle the get_key_info tool request
    pub async fn handle(
        &self,
        Parameters(args): Parameters<GetKeyInfoArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = args.validate() {
            return Err(McpError::invalid_params(
                format!("Invalid arguments: {}", e),
                None,
            ));
        }

        let info = self.cache.info(&args.key).await.map_err(map_cache_error)?;
        Ok(ResponseFormatter::format_key_info(&args.key, &info))
    }
}
