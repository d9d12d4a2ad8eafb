//! Tool Registry Module
//!
//! Manages tool definitions and schema generation for the MCP protocol.
//! This module centralizes all tool metadata to enable consistent tool listing.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::ErrorData as McpError;
use rmcp::model::Tool;

use crate::args::{
    ClearAllArgs, ExecuteArgs, GetKeyInfoArgs, GetStatsArgs, GetTopKeysArgs,
    InvalidatePatternArgs, WarmArgs,
};

/// Tool definitions for MCP protocol
pub struct ToolDefinitions;

impl ToolDefinitions {
    /// Get the execute tool definition
    pub fn execute() -> Result<Tool, McpError> {
        Self::create_tool(
            "execute",
            "Execute a registered operation with result caching; identical parameters reuse the cached result",
            schemars::schema_for!(ExecuteArgs),
        )
    }

    /// Get the get_key_info tool definition
    pub fn get_key_info() -> Result<Tool, McpError> {
        Self::create_tool(
            "get_key_info",
            "Inspect one cache key: existence, remaining TTL, and stored size",
            schemars::schema_for!(GetKeyInfoArgs),
        )
    }

    /// Get the invalidate_pattern tool definition
    pub fn invalidate_pattern() -> Result<Tool, McpError> {
        Self::create_tool(
            "invalidate_pattern",
            "Delete cache entries matching a key pattern (requires confirm=true)",
            schemars::schema_for!(InvalidatePatternArgs),
        )
    }

    /// Get the clear_all tool definition
    pub fn clear_all() -> Result<Tool, McpError> {
        Self::create_tool(
            "clear_all",
            "Delete every cache entry (requires confirm=true and the exact confirmation phrase)",
            schemars::schema_for!(ClearAllArgs),
        )
    }

    /// Get the get_stats tool definition
    pub fn get_stats() -> Result<Tool, McpError> {
        Self::create_tool(
            "get_stats",
            "Cache statistics: hits, misses, hit rate, invalidations, and store totals",
            schemars::schema_for!(GetStatsArgs),
        )
    }

    /// Get the get_top_keys tool definition
    pub fn get_top_keys() -> Result<Tool, McpError> {
        Self::create_tool(
            "get_top_keys",
            "List the most-accessed cache keys, optionally grouped by operation",
            schemars::schema_for!(GetTopKeysArgs),
        )
    }

    /// Get the warm tool definition
    pub fn warm() -> Result<Tool, McpError> {
        Self::create_tool(
            "warm",
            "Preload cache entries by executing operations ahead of demand",
            schemars::schema_for!(WarmArgs),
        )
    }

    /// Create a tool from schema
    fn create_tool(
        name: &'static str,
        description: &'static str,
        schema: schemars::Schema,
    ) -> Result<Tool, McpError> {
        let schema_value = serde_json::to_value(schema)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        let input_schema = schema_value
            .as_object()
            .ok_or_else(|| {
                McpError::internal_error(format!("Schema for {} is not an object", name), None)
            })?
            .clone();

        Ok(Tool {
            name: Cow::Borrowed(name),
            title: None,
            description: Some(Cow::Borrowed(description)),
            input_schema: Arc::new(input_schema),
            output_schema: None,
            annotations: None,
            icons: None,
            meta: Default::default(),
        })
    }
}

/// Create the complete list of available tools
///
/// Returns all tool definitions for the MCP list_tools response.
pub fn create_tool_list() -> Result<Vec<Tool>, McpError> {
    Ok(vec![
        ToolDefinitions::execute()?,
        ToolDefinitions::get_key_info()?,
        ToolDefinitions::invalidate_pattern()?,
        ToolDefinitions::clear_all()?,
        ToolDefinitions::get_stats()?,
        ToolDefinitions::get_top_keys()?,
        ToolDefinitions::warm()?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_list_is_complete() {
        let tools = create_tool_list().unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert_eq!(
            names,
            vec![
                "execute",
                "get_key_info",
                "invalidate_pattern",
                "clear_all",
                "get_stats",
                "get_top_keys",
                "warm",
            ]
        );
        // Every tool carries an object schema for its arguments.
        for tool in &tools {
            assert!(tool.input_schema.contains_key("properties") || tool.name == "get_stats");
        }
    }
}
