//! Node-visit and wall-clock budget for one query.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::EngineError;

/// Shared by every worker of a query. Exceeding either limit aborts the whole
/// query with [`EngineError::Timeout`].
#[derive(Debug)]
pub struct Budget {
    visited: AtomicU64,
    max_visits: Option<u64>,
    deadline: Option<Instant>,
}

impl Budget {
    pub fn new(max_visits: Option<u64>, timeout: Option<Duration>) -> Self {
        Self {
            visited: AtomicU64::new(0),
            max_visits,
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    /// Record one expanded connection.
    pub fn charge(&self) -> Result<(), EngineError> {
        let visited = self.visited.fetch_add(1, Ordering::Relaxed) + 1;
        if self.max_visits.is_some_and(|max| visited > max) {
            return Err(EngineError::Timeout { visited });
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(EngineError::Timeout { visited });
        }
        Ok(())
    }

    /// Connections expanded so far.
    pub fn visited(&self) -> u64 {
        self.visited.load(Ordering::Relaxed)
    }
}
