//! Opcache Server - Operation Result Caching over MCP
//!
//! Caches the results of expensive operations behind the MCP tool surface.
//! Every operation runs through a read-through cache with deterministic
//! keys, pattern-based TTLs, and single-flight population; administrative
//! tools expose inspection, invalidation, statistics, and warming.
//!
//! ## Architecture
//!
//! - Cache library: keys, TTL policy, stores, single-flight, stats (opcache)
//! - Server: MCP protocol, tool routing, response formatting (opcache-server)

use clap::Parser;
use opcache_server::run;

/// Command line interface for the Opcache server
#[derive(Parser, Debug)]
#[command(name = "opcache-server")]
#[command(about = "Opcache - Operation Result Caching MCP Server")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    run(cli.config.as_deref()).await
}
