//! Executor seam between the cache and the operations it fronts.
//!
//! The middleware never knows what an operation does; it only needs a name
//! to key under and a way to run the real work on a miss. Registered
//! operations are also what `warm` replays when an operator preloads the
//! cache.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// One cacheable unit of work.
#[async_trait]
pub trait Operation: Send + Sync {
    /// Stable name the operation is registered and cached under.
    fn name(&self) -> &str;

    /// Short human description, surfaced to operators.
    fn description(&self) -> &str;

    /// Perform the real work. Runs only on cache misses.
    async fn run(&self, params: &Map<String, Value>) -> Result<Value>;
}

/// Name-indexed set of executable operations.
#[derive(Default)]
pub struct OperationRegistry {
    operations: HashMap<String, Arc<dyn Operation>>,
}

impl OperationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation under its own name, replacing any previous
    /// registration of that name.
    pub fn register(&mut self, operation: Arc<dyn Operation>) {
        self.operations
            .insert(operation.name().to_string(), operation);
    }

    /// Look up an operation by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Operation>> {
        self.operations.get(name).map(Arc::clone)
    }

    /// Registered operation names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
