//! MCP Server Implementation
//!
//! Core MCP protocol server exposing the operation cache. All tool calls
//! are routed to dedicated handlers that share one cache and one operation
//! registry through constructor injection.

use std::sync::Arc;

use rmcp::ErrorData as McpError;
use rmcp::ServerHandler;
use rmcp::model::{
    CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
    ServerCapabilities, ServerInfo,
};

use opcache::{OperationCache, OperationRegistry};

use crate::handlers::{
    ClearAllHandler, ExecuteHandler, GetKeyInfoHandler, GetStatsHandler, GetTopKeysHandler,
    InvalidatePatternHandler, WarmHandler,
};
use crate::tools::{ToolHandlers, create_tool_list, route_tool_call};

/// Core MCP server implementation
///
/// Exposes the cache's execution and administrative surfaces as MCP tools.
/// It owns nothing but dependency handles; the cache and registry are built
/// during initialization and shared with every handler.
#[derive(Clone)]
pub struct OpcacheServer {
    /// The operation cache every tool works against
    cache: Arc<OperationCache>,
    /// Registered operations for execute and warm
    registry: Arc<OperationRegistry>,
    /// Handler for cached execution
    execute_handler: Arc<ExecuteHandler>,
    /// Handler for key inspection
    get_key_info_handler: Arc<GetKeyInfoHandler>,
    /// Handler for pattern invalidation
    invalidate_pattern_handler: Arc<InvalidatePatternHandler>,
    /// Handler for clearing the cache
    clear_all_handler: Arc<ClearAllHandler>,
    /// Handler for the statistics overview
    get_stats_handler: Arc<GetStatsHandler>,
    /// Handler for the top-keys report
    get_top_keys_handler: Arc<GetTopKeysHandler>,
    /// Handler for cache warming
    warm_handler: Arc<WarmHandler>,
}

impl OpcacheServer {
    /// Create a new MCP server with injected dependencies
    pub fn new(cache: Arc<OperationCache>, registry: Arc<OperationRegistry>) -> Self {
        let execute_handler = Arc::new(ExecuteHandler::new(
            Arc::clone(&cache),
            Arc::clone(&registry),
        ));
        let get_key_info_handler = Arc::new(GetKeyInfoHandler::new(Arc::clone(&cache)));
        let invalidate_pattern_handler =
            Arc::new(InvalidatePatternHandler::new(Arc::clone(&cache)));
        let clear_all_handler = Arc::new(ClearAllHandler::new(Arc::clone(&cache)));
        let get_stats_handler = Arc::new(GetStatsHandler::new(Arc::clone(&cache)));
        let get_top_keys_handler = Arc::new(GetTopKeysHandler::new(Arc::clone(&cache)));
        let warm_handler = Arc::new(WarmHandler::new(Arc::clone(&cache), Arc::clone(&registry)));

        Self {
            cache,
            registry,
            execute_handler,
            get_key_info_handler,
            invalidate_pattern_handler,
            clear_all_handler,
            get_stats_handler,
            get_top_keys_handler,
            warm_handler,
        }
    }

    /// Access to the underlying cache
    pub fn cache(&self) -> Arc<OperationCache> {
        Arc::clone(&self.cache)
    }

    /// Access to the operation registry
    pub fn registry(&self) -> Arc<OperationRegistry> {
        Arc::clone(&self.registry)
    }
}

impl ServerHandler for OpcacheServer {
    /// Get server information and capabilities
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "Opcache Server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Opcache Server - Operation Result Caching\n\n\
                 Executes registered operations with deterministic result caching:\n\
                 identical parameters reuse the stored result until its TTL elapses.\n\n\
                 Tools:\n\
                 - execute: Run an operation through the cache\n\
                 - get_key_info: Inspect one cache key\n\
                 - invalidate_pattern: Delete entries matching a pattern (confirm required)\n\
                 - clear_all: Delete every entry (confirm plus exact phrase required)\n\
                 - get_stats: Hit/miss counters and store totals\n\
                 - get_top_keys: Most accessed keys, optionally per operation\n\
                 - warm: Preload entries ahead of demand\n"
                    .to_string(),
            ),
        }
    }

    /// List available tools
    async fn list_tools(
        &self,
        _pagination: Option<PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = create_tool_list()?;
        Ok(ListToolsResult {
            tools,
            meta: Default::default(),
            next_cursor: None,
        })
    }

    /// Call a tool
    async fn call_tool(
        &self,
        request: rmcp::model::CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let handlers = ToolHandlers {
            execute: Arc::clone(&self.execute_handler),
            get_key_info: Arc::clone(&self.get_key_info_handler),
            invalidate_pattern: Arc::clone(&self.invalidate_pattern_handler),
            clear_all: Arc::clone(&self.clear_all_handler),
            get_stats: Arc::clone(&self.get_stats_handler),
            get_top_keys: Arc::clone(&self.get_top_keys_handler),
            warm: Arc::clone(&self.warm_handler),
        };
        route_tool_call(request, &handlers).await
    }
}
