//! # Opcache Server
//!
//! MCP server exposing the operation cache over stdio. Operations execute
//! through a read-through cache with single-flight population; a set of
//! administrative tools covers inspection, invalidation, and warming.
//!
//! ## Architecture
//!
//! - `args` - Tool argument types with validation and JSON schemas
//! - `operations` - Built-in operations the server can execute and cache
//! - `handlers` - One handler per MCP tool
//! - `tools` - Tool definitions and call routing
//! - `formatter` - Markdown response formatting
//! - `mcp_server` - MCP protocol implementation
//! - `init` - Startup wiring from configuration to a running server

pub mod args;
pub mod formatter;
pub mod handlers;
pub mod init;
pub mod mcp_server;
pub mod operations;
pub mod tools;

pub use init::run;
pub use mcp_server::OpcacheServer;
