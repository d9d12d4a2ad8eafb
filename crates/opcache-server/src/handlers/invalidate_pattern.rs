//! Invalidate Pattern Tool Handler
//!
//! Handles the invalidate_pattern MCP tool call. The confirmation gate and
//! pattern checks live in the cache library; this handler only translates
//! their refusals into protocol errors.

use std::sync::Arc;

use rmcp::ErrorData as McpError;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use validator::Validate;

use opcache::OperationCache;

use crate::args::InvalidatePatternArgs;
use crate::formatter::ResponseFormatter;
use crate::handlers::map_cache_error;

/// Handler for pattern-scoped cache invalidation
pub struct InvalidatePatternHandler {
    cache: Arc<OperationCache>,
}

impl InvalidatePatternHandler {
    /// Create a new invalidate_pattern handler
    pub fn new(cache: Arc<OperationCache>) -> Self {
        Self { cache }
    }

    /// Handle the invalidate_pattern tool request
    pub async fn handle(
        &self,
        Parameters(args): Parameters<InvalidatePatternArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = args.validate() {
            return Err(McpError::invalid_params(
                format!("Invalid arguments: {}", e),
                None,
            ));
        }

        let count = self
            .cache
            .invalidate_pattern(&args.pattern, args.confirm)
            .await
            .map_err(map_cache_error)?;
        Ok(ResponseFormatter::format_invalidation(&args.pattern, count))
    }
}
