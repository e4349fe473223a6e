//! Query-scoped memo of per-connection results.
//!
//! The memo doubles as the work gate between the workers of one query: a
//! connection is expanded by whichever worker claims it first, and every
//! other worker that reaches it waits for that result instead of computing
//! its own copy.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex};

use super::EngineError;
use crate::domain::Distribution;
use crate::graph::{ConnectionId, StationId};

type Key = (ConnectionId, StationId);

/// One depth-first walk. Claims are owned by walks, not threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Worker(u64);

/// Outcome of [`MemoTable::claim`].
#[derive(Debug, Clone, PartialEq)]
pub enum Claim {
    /// Already computed, possibly after waiting for another worker.
    Done(Arc<Distribution>),

    /// The caller must compute the result and [`MemoTable::insert`] it.
    Owned,

    /// The key is held by the caller itself, directly or through a chain of
    /// workers waiting on each other.
    Cycle,
}

#[derive(Debug)]
enum Slot {
    Claimed(Worker),
    Done(Arc<Distribution>),
}

#[derive(Debug, Default)]
struct State {
    slots: HashMap<Key, Slot>,

    /// Key each blocked worker is waiting for.
    waiting: HashMap<Worker, Key>,

    /// First error of any worker. Ends every wait.
    failed: Option<EngineError>,
}

impl State {
    /// Whether `owner` is `worker` or transitively waits on it.
    fn waits_on(&self, owner: Worker, worker: Worker) -> bool {
        let mut current = owner;
        for _ in 0..=self.waiting.len() {
            if current == worker {
                return true;
            }
            match self.waiting.get(&current).and_then(|key| self.slots.get(key)) {
                Some(Slot::Claimed(next)) => current = *next,
                _ => return false,
            }
        }
        false
    }
}

/// Destination-arrival distributions computed during one query, keyed by
/// `(connection, destination)`.
///
/// Each key is written at most once: a later insert for the same key returns
/// the value that is already stored. The table is owned by a single query and
/// dropped with it.
#[derive(Debug, Default)]
pub struct MemoTable {
    state: Mutex<State>,
    ready: Condvar,
    workers: AtomicU64,
}

impl MemoTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh worker identity for one walk.
    pub fn worker(&self) -> Worker {
        Worker(self.workers.fetch_add(1, Ordering::Relaxed))
    }

    /// The stored result, if any.
    pub fn get(&self, connection: ConnectionId, destination: StationId) -> Option<Arc<Distribution>> {
        match self.state.lock().slots.get(&(connection, destination)) {
            Some(Slot::Done(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Take responsibility for computing `(connection, destination)`.
    ///
    /// Blocks while another worker holds the key. Fails with the first
    /// recorded error if any worker has given up.
    pub fn claim(
        &self,
        connection: ConnectionId,
        destination: StationId,
        worker: Worker,
    ) -> Result<Claim, EngineError> {
        let key = (connection, destination);
        let mut state = self.state.lock();
        loop {
            if let Some(err) = &state.failed {
                return Err(err.clone());
            }
            let owner = match state.slots.get(&key) {
                Some(Slot::Done(value)) => return Ok(Claim::Done(value.clone())),
                Some(Slot::Claimed(owner)) => Some(*owner),
                None => None,
            };
            let Some(owner) = owner else {
                state.slots.insert(key, Slot::Claimed(worker));
                return Ok(Claim::Owned);
            };
            if state.waits_on(owner, worker) {
                return Ok(Claim::Cycle);
            }

            state.waiting.insert(worker, key);
            self.ready.wait(&mut state);
            state.waiting.remove(&worker);
        }
    }

    /// Store `value` unless the key already has a result, releasing any
    /// claim on it. Returns whichever value ends up stored.
    pub fn insert(
        &self,
        connection: ConnectionId,
        destination: StationId,
        value: Distribution,
    ) -> Arc<Distribution> {
        let key = (connection, destination);
        let mut state = self.state.lock();
        if let Some(Slot::Done(existing)) = state.slots.get(&key) {
            return existing.clone();
        }
        let value = Arc::new(value);
        state.slots.insert(key, Slot::Done(value.clone()));
        drop(state);
        self.ready.notify_all();
        value
    }

    /// Record that a worker gave up. Waiting and later claims fail with the
    /// first recorded error.
    pub fn fail(&self, err: EngineError) {
        self.state.lock().failed.get_or_insert(err);
        self.ready.notify_all();
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .slots
            .values()
            .filter(|slot| matches!(slot, Slot::Done(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
