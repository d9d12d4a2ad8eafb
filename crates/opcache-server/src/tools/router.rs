//! Tool Router Module
//!
//! Routes incoming tool call requests to the appropriate handlers.
//! This module provides a centralized dispatch mechanism for MCP tool calls.

use std::sync::Arc;

use rmcp::ErrorData as McpError;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolRequestParam, CallToolResult};

use crate::args::{
    ClearAllArgs, ExecuteArgs, GetKeyInfoArgs, GetStatsArgs, GetTopKeysArgs,
    InvalidatePatternArgs, WarmArgs,
};
use crate::handlers::{
    ClearAllHandler, ExecuteHandler, GetKeyInfoHandler, GetStatsHandler, GetTopKeysHandler,
    InvalidatePatternHandler, WarmHandler,
};

/// Handler references for tool routing
pub struct ToolHandlers {
    /// Handler for cached operation execution
    pub execute: Arc<ExecuteHandler>,
    /// Handler for key inspection
    pub get_key_info: Arc<GetKeyInfoHandler>,
    /// Handler for pattern invalidation
    pub invalidate_pattern: Arc<InvalidatePatternHandler>,
    /// Handler for clearing the cache
    pub clear_all: Arc<ClearAllHandler>,
    /// Handler for the statistics overview
    pub get_stats: Arc<GetStatsHandler>,
    /// Handler for the top-keys report
    pub get_top_keys: Arc<GetTopKeysHandler>,
    /// Handler for cache warming
    pub warm: Arc<WarmHandler>,
}

/// Route a tool call request to the appropriate handler
///
/// Parses the request arguments and delegates to the matching handler.
pub async fn route_tool_call(
    request: CallToolRequestParam,
    handlers: &ToolHandlers,
) -> Result<CallToolResult, McpError> {
    match request.name.as_ref() {
        "execute" => {
            let args = parse_args::<ExecuteArgs>(&request)?;
            handlers.execute.handle(Parameters(args)).await
        }
        "get_key_info" => {
            let args = parse_args::<GetKeyInfoArgs>(&request)?;
            handlers.get_key_info.handle(Parameters(args)).await
        }
        "invalidate_pattern" => {
            let args = parse_args::<InvalidatePatternArgs>(&request)?;
            handlers.invalidate_pattern.handle(Parameters(args)).await
        }
        "clear_all" => {
            let args = parse_args::<ClearAllArgs>(&request)?;
            handlers.clear_all.handle(Parameters(args)).await
        }
        "get_stats" => {
            let args = parse_args::<GetStatsArgs>(&request)?;
            handlers.get_stats.handle(Parameters(args)).await
        }
        "get_top_keys" => {
            let args = parse_args::<GetTopKeysArgs>(&request)?;
            handlers.get_top_keys.handle(Parameters(args)).await
        }
        "warm" => {
            let args = parse_args::<WarmArgs>(&request)?;
            handlers.warm.handle(Parameters(args)).await
        }
        _ => Err(McpError::invalid_params(
            format!("Unknown tool: {}", request.name),
            None,
        )),
    }
}

/// Parse request arguments into the expected type
fn parse_args<T: serde::de::DeserializeOwned>(
    request: &CallToolRequestParam,
) -> Result<T, McpError> {
    let args_value = serde_json::Value::Object(request.arguments.clone().unwrap_or_default());
    serde_json::from_value(args_value)
        .map_err(|e| McpError::invalid_params(format!("Invalid arguments: {}", e), None))
}
