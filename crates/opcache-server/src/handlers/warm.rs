//! Warm Tool Handler
//!
//! Handles the warm MCP tool call: preloads cache entries by running
//! registered operations through the normal population path.

use std::sync::Arc;

use rmcp::ErrorData as McpError;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use validator::Validate;

use opcache::{OperationCache, OperationRegistry, WarmRequest};

use crate::args::WarmArgs;
use crate::formatter::ResponseFormatter;
use crate::handlers::map_cache_error;

/// Handler for cache warming
pub struct WarmHandler {
    cache: Arc<OperationCache>,
    registry: Arc<OperationRegistry>,
}

impl WarmHandler {
    /// Create a new warm handler
    pub fn new(cache: Arc<OperationCache>, registry: Arc<OperationRegistry>) -> Self {
        Self { cache, registry }
    }

    /// Handle the warm tool request
    pub async fn handle(
        &self,
        Parameters(args): Parameters<WarmArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = args.validate() {
            return Err(McpError::invalid_params(
                format!("Invalid arguments: {}", e),
                None,
            ));
        }

        let requests: Vec<WarmRequest> = args
            .entries
            .into_iter()
            .map(|entry| WarmRequest {
                operation: entry.operation,
                params: entry.params,
            })
            .collect();

        let report = self
            .cache
            .warm(&self.registry, requests)
            .await
            .map_err(map_cache_error)?;
        Ok(ResponseFormatter::format_warm_report(&report))
    }
}
