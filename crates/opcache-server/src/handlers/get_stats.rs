//! Get Stats Tool Handler
//!
//! Handles the get_stats MCP tool call. The overview never fails; when the
//! store is unreachable the store-side numbers are reported as unavailable.

use std::sync::Arc;

use rmcp::ErrorData as McpError;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;

use opcache::OperationCache;

use crate::args::GetStatsArgs;
use crate::formatter::ResponseFormatter;

/// Handler for the statistics overview
pub struct GetStatsHandler {
    cache: Arc<OperationCache>,
}

impl GetStatsHandler {
    /// Create a new get_stats handler
    pub fn new(cache: Arc<OperationCache>) -> Self {
        Self { cache }
    }

    /// Handle the get_stats tool request
    pub async fn handle(
        &self,
        Parameters(_args): Parameters<GetStatsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let overview = self.cache.stats_overview().await;
        Ok(ResponseFormatter::format_stats(&overview))
    }
}
