//! Server initialization utilities
//!
//! Builds every component in dependency order: configuration, logging, the
//! entry store, the cache, the operation registry, and finally the MCP
//! server on stdio. A Redis backend that cannot be reached is a startup
//! error; outages after startup degrade to pass-through execution instead.

use std::path::Path;
use std::sync::Arc;

use rmcp::ServiceExt;
use rmcp::transport::stdio;

use opcache::logging::{init_logging, log_health_check};
use opcache::store::HealthStatus;
use opcache::{
    CacheConfig, ConfigLoader, EntryStore, MemoryEntryStore, OperationCache, RedisEntryStore,
    StoreBackend,
};

use crate::mcp_server::OpcacheServer;
use crate::operations::builtin_registry;

/// Run the cache MCP server until the client disconnects or a shutdown
/// signal arrives.
pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = config_path {
        loader = loader.with_config_path(path);
    }
    let config = loader.load()?;

    init_logging(&config.logging)?;
    tracing::info!(
        "🚀 Starting {} v{}",
        config.server.name,
        env!("CARGO_PKG_VERSION")
    );

    let store = build_store(&config.cache).await?;
    let cache = Arc::new(OperationCache::from_config(&config.cache, store)?);
    if !cache.is_enabled() {
        tracing::warn!("Cache is disabled; operations will execute uncached");
    }

    let registry = Arc::new(builtin_registry());
    tracing::info!("Registered operations: {}", registry.names().join(", "));

    let server = OpcacheServer::new(cache, registry);

    // Handle graceful shutdown signals
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        tracing::info!("🛑 Received shutdown signal, initiating graceful shutdown...");
    };

    tracing::info!("📡 Starting MCP protocol server on stdio transport");
    let service_future = server.serve(stdio());

    tokio::select! {
        result = service_future => {
            match result {
                Ok(service) => {
                    tracing::info!("🎉 MCP server started successfully, waiting for connections...");
                    service.waiting().await?;
                    tracing::info!("👋 MCP server shutdown complete");
                }
                Err(e) => {
                    tracing::error!("💥 Failed to start MCP service: {:?}", e);
                    return Err(e.into());
                }
            }
        }
        _ = shutdown_signal => {
            tracing::info!("🔄 Graceful shutdown initiated");
        }
    }

    Ok(())
}

/// Build the entry store the configuration asks for.
async fn build_store(
    cache_config: &CacheConfig,
) -> Result<Arc<dyn EntryStore>, Box<dyn std::error::Error>> {
    match cache_config.backend {
        StoreBackend::Memory => {
            tracing::info!(
                "Using in-process entry store (up to {} entries)",
                cache_config.max_entries
            );
            Ok(Arc::new(MemoryEntryStore::new(cache_config.max_entries)))
        }
        StoreBackend::Redis => {
            let url = cache_config
                .redis_url
                .as_deref()
                .ok_or("Redis backend requires cache.redis_url to be set")?;
            let store = RedisEntryStore::connect(url, &cache_config.namespace).await?;
            let status = store.health_check().await?;
            log_health_check(
                "redis",
                matches!(status, HealthStatus::Healthy),
                Some(&format!("namespace '{}'", cache_config.namespace)),
            );
            Ok(Arc::new(store))
        }
    }
}
