//! Single-flight coordination for cache population.
//!
//! When several callers miss on the same key at once, only one of them may
//! run the expensive executor. The first caller to claim a key becomes the
//! leader; everyone else attaches to the in-flight ticket and receives a
//! clone of the leader's outcome. Population runs on a detached task, so a
//! leader that abandons its call (client timeout, dropped future) does not
//! cancel the work the waiters are parked on.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::{Error, Result, SharedError};

/// Outcome delivered to every caller attached to one population flight.
pub type PopulationResult = std::result::Result<Value, SharedError>;

type TicketMap = DashMap<String, Vec<oneshot::Sender<PopulationResult>>>;

/// Coordinates concurrent population so each key is computed once at a time.
///
/// Cloning is cheap and clones share the same ticket map.
#[derive(Clone, Default)]
pub struct PopulationCoordinator {
    tickets: Arc<TicketMap>,
}

impl PopulationCoordinator {
    /// Create a coordinator with no flights in progress.
    pub fn new() -> Self {
        Self {
            tickets: Arc::new(DashMap::new()),
        }
    }

    /// Run `populate` for `key`, collapsing concurrent callers into one
    /// execution.
    ///
    /// The map lock is held only long enough to register a ticket; it is
    /// never held across the executor. Failures fan out to every attached
    /// caller and are never retained, so the next call after settlement
    /// executes again.
    pub async fn run_once<F, Fut>(&self, key: &str, populate: F) -> PopulationResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let leader = match self.tickets.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().push(sender);
                false
            }
            Entry::Vacant(vacant) => {
                vacant.insert(vec![sender]);
                true
            }
        };

        if leader {
            // No await point sits between ticket creation and spawn, so a
            // caller cancelled right here cannot strand the ticket.
            let future = populate();
            let guard = TicketGuard {
                tickets: Arc::clone(&self.tickets),
                key: key.to_string(),
                settled: false,
            };
            tokio::spawn(async move {
                let outcome = future.await.map_err(SharedError::new);
                guard.settle(outcome);
            });
        }

        match receiver.await {
            Ok(outcome) => outcome,
            // The sender was dropped without settling, which only happens
            // when the population task panicked.
            Err(_) => Err(SharedError::new(Error::executor(format!(
                "population of '{key}' did not complete"
            )))),
        }
    }

    /// Number of keys currently being populated.
    pub fn in_flight(&self) -> usize {
        self.tickets.len()
    }
}

/// Removes the ticket when the population task unwinds.
///
/// Dropping the ticket drops every waiter's sender, so waiters observe the
/// panic as a closed channel instead of hanging forever.
struct TicketGuard {
    tickets: Arc<TicketMap>,
    key: String,
    settled: bool,
}

impl TicketGuard {
    fn settle(mut self, outcome: PopulationResult) {
        if let Some((_, waiters)) = self.tickets.remove(&self.key) {
            for waiter in waiters {
                // A waiter that went away is not an error.
                let _ = waiter.send(outcome.clone());
            }
        }
        self.settled = true;
    }
}

impl Drop for TicketGuard {
    fn drop(&mut self) {
        if !self.settled {
            self.tickets.remove(&self.key);
        }
    }
}
