//! Execute Tool Handler
//!
//! Handles the execute MCP tool call: runs a registered operation through
//! the cache and reports whether the result was a hit.

use std::sync::Arc;
use std::time::Instant;

use rmcp::ErrorData as McpError;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use validator::Validate;

use opcache::{OperationCache, OperationRegistry};

use crate::args::ExecuteArgs;
use crate::formatter::ResponseFormatter;
use crate::handlers::map_cache_error;

/// Handler for cached operation execution
pub struct ExecuteHandler {
    cache: Arc<OperationCache>,
    registry: Arc<OperationRegistry>,
}

impl ExecuteHandler {
    /// Create a new execute handler
    pub fn new(cache: Arc<OperationCache>, registry: Arc<OperationRegistry>) -> Self {
        Self { cache, registry }
    }

    /// Handle the execute tool request
    pub async fn handle(
        &self,
        Parameters(args): Parameters<ExecuteArgs>,
    ) -> Result<CallToolResult, McpError> {
        if let Err(e) = args.validate() {
            return Err(McpError::invalid_params(
                format!("Invalid arguments: {}", e),
                None,
            ));
        }

        let Some(operation) = self.registry.get(&args.operation) else {
            return Err(McpError::invalid_params(
                format!(
                    "Unknown operation '{}'. Available operations: {}",
                    args.operation,
                    self.registry.names().join(", ")
                ),
                None,
            ));
        };

        let started = Instant::now();
        let run_params = args.params.clone();
        let outcome = self
            .cache
            .execute(&args.operation, &args.params, move || async move {
                operation.run(&run_params).await
            })
            .await
            .map_err(map_cache_error)?;

        ResponseFormatter::format_execute_response(&args.operation, &outcome, started.elapsed())
    }
}
