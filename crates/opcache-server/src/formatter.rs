//! Response formatting utilities for the cache MCP server
//!
//! Renders tool results as operator-friendly markdown. Formatting is kept
//! out of the handlers so every tool responds in the same voice.

use std::time::Duration;

use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, Content};

use opcache::store::KeyInfo;
use opcache::{CacheOutcome, StatsOverview, TopKeysReport, WarmReport};

/// Response formatter for cache server tools
pub struct ResponseFormatter;

impl ResponseFormatter {
    /// Format an execute result with its cache disposition
    pub fn format_execute_response(
        operation: &str,
        outcome: &CacheOutcome,
        duration: Duration,
    ) -> Result<CallToolResult, McpError> {
        let rendered = serde_json::to_string_pretty(&outcome.value)
            .map_err(|e| McpError::internal_error(format!("Failed to render result: {}", e), None))?;

        let disposition = if outcome.was_cache_hit {
            "⚡ **Served from cache**"
        } else {
            "🔨 **Computed by executor**"
        };
        let message = format!(
            "🧰 **Operation Executed**\n\n\
             **Operation:** `{}`\n\
             {} in {:.3}s\n\n\
             **Result:**\n```json\n{}\n```",
            operation,
            disposition,
            duration.as_secs_f64(),
            rendered
        );

        tracing::info!(
            "Operation '{}' completed in {:?} (cache hit: {})",
            operation,
            duration,
            outcome.was_cache_hit
        );
        Ok(CallToolResult::success(vec![Content::text(message)]))
    }

    /// Format key inspection details
    pub fn format_key_info(key: &str, info: &KeyInfo) -> CallToolResult {
        let message = if info.exists {
            let ttl = info
                .ttl_remaining_secs
                .map_or("no expiry".to_string(), |secs| format!("{}s", secs));
            let size = info
                .size_bytes
                .map_or("unknown".to_string(), |bytes| format!("{} bytes", bytes));
            format!(
                "🔑 **Cache Key Info**\n\n\
                 **Key:** `{}`\n\
                 • Exists: yes\n\
                 • TTL remaining: {}\n\
                 • Size: {}",
                key, ttl, size
            )
        } else {
            format!(
                "🔑 **Cache Key Info**\n\n\
                 **Key:** `{}`\n\
                 • Exists: no (never stored, expired, or invalidated)",
                key
            )
        };
        CallToolResult::success(vec![Content::text(message)])
    }

    /// Format a pattern invalidation result
    pub fn format_invalidation(pattern: &str, count: u64) -> CallToolResult {
        let message = format!(
            "🗑️ **Entries Invalidated**\n\n\
             **Pattern:** `{}`\n\
             **Entries deleted:** {}",
            pattern, count
        );
        tracing::info!("Invalidated {} entries via tool call", count);
        CallToolResult::success(vec![Content::text(message)])
    }

    /// Format a full cache clear result
    pub fn format_clear_all(count: u64) -> CallToolResult {
        let message = format!(
            "🧹 **Cache Cleared**\n\n\
             **Entries deleted:** {}\n\n\
             The cache will repopulate as operations execute.",
            count
        );
        tracing::info!("Cleared entire cache ({} entries) via tool call", count);
        CallToolResult::success(vec![Content::text(message)])
    }

    /// Format the statistics overview
    pub fn format_stats(overview: &StatsOverview) -> CallToolResult {
        let stats = &overview.stats;
        let entry_count = overview
            .entry_count
            .map_or("unavailable".to_string(), |n| n.to_string());
        let total_size = overview
            .total_size_bytes
            .map_or("unavailable".to_string(), |n| format!("{} bytes", n));

        let mut message = format!(
            "📊 **Cache Statistics**\n\n\
             **Backend:** {}\n\
             **Live entries:** {}\n\
             **Stored payload:** {}\n\n\
             **Traffic:**\n\
             • Hits: {}\n\
             • Misses: {}\n\
             • Hit rate: {:.1}%\n\
             • Invalidations: {}\n",
            overview.backend,
            entry_count,
            total_size,
            stats.hits,
            stats.misses,
            stats.hit_rate * 100.0,
            stats.invalidations
        );

        if !stats.top_keys.is_empty() {
            message.push_str("\n**Hottest keys:**\n");
            for access in &stats.top_keys {
                message.push_str(&format!("• `{}`: {} accesses\n", access.key, access.count));
            }
        }
        CallToolResult::success(vec![Content::text(message)])
    }

    /// Format the top-keys report, grouped or flat
    pub fn format_top_keys(report: &TopKeysReport) -> CallToolResult {
        let mut message = "🔥 **Most Accessed Keys**\n\n".to_string();

        if let Some(grouped) = &report.by_operation {
            if grouped.is_empty() {
                message.push_str("No traffic recorded yet.\n");
            }
            for group in grouped {
                message.push_str(&format!(
                    "• `{}:*`: {} accesses\n",
                    group.operation, group.count
                ));
            }
        } else {
            if report.keys.is_empty() {
                message.push_str("No traffic recorded yet.\n");
            }
            for access in &report.keys {
                message.push_str(&format!("• `{}`: {} accesses\n", access.key, access.count));
            }
        }
        CallToolResult::success(vec![Content::text(message)])
    }

    /// Format a warm run report
    pub fn format_warm_report(report: &WarmReport) -> CallToolResult {
        let mut message = format!(
            "♨️ **Cache Warm Finished**\n\n\
             • Requested: {}\n\
             • Populated: {}\n\
             • Failed: {}\n",
            report.requested, report.succeeded, report.failed
        );

        if !report.failures.is_empty() {
            message.push_str("\n**Failures:**\n");
            for failure in &report.failures {
                message.push_str(&format!("• `{}`: {}\n", failure.operation, failure.error));
            }
        }
        CallToolResult::success(vec![Content::text(message)])
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    /// Helper to extract text from CallToolResult
    fn extract_text(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| {
                if let rmcp::model::RawContent::Text(text_content) = &c.raw {
                    Some(text_content.text.clone())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    #[test]
    fn test_format_execute_marks_hits() {
        let outcome = CacheOutcome {
            value: json!({"amount": "100"}),
            was_cache_hit: true,
        };
        let result =
            ResponseFormatter::format_execute_response("balance", &outcome, Duration::from_millis(2))
                .unwrap();
        let text = extract_text(&result);
        assert!(text.contains("Served from cache"));
        assert!(text.contains("\"amount\": \"100\""));
    }

    #[test]
    fn test_format_key_info_absent_key() {
        let result = ResponseFormatter::format_key_info("balance:abc", &KeyInfo::absent());
        assert!(extract_text(&result).contains("Exists: no"));
    }
}
