//! Stochastic journey-strategy engine.
//!
//! Given a [`Timetable`] whose stops carry delay distributions, the engine
//! computes the distribution of arrival time at a destination when the
//! traveler always tries the onward connection with the earliest expected
//! arrival first and falls back to the next one only after missing it.
//!
//! All per-query state (memo, budget, worker pool) is created by
//! [`Engine::query`] or [`Engine::distribution_at`] and dropped when the
//! call returns, so one engine may serve any number of concurrent queries.

mod budget;
mod config;
mod memo;
mod propagate;
mod query;
mod reachability;


use crate::domain::{Distribution, InvalidDistribution, Mtime};
use crate::graph::{ConnectionId, StationId, Timetable};

use budget::Budget;
use memo::MemoTable;
use propagate::Propagator;

pub use config::EngineConfig;
pub use query::{DepartureOption, QueryOutcome, QueryRequest};
pub use reachability::reachable_probability;

/// Errors that abort a query. An unreachable destination is not an error:
/// it is a distribution without mass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// A stop or intermediate result violates the distribution invariants
    #[error("invalid distribution: {0}")]
    InvalidDistribution(#[from] InvalidDistribution),

    /// A connection depends on itself through zero-duration legs
    #[error("dependency cycle through connection {connection}")]
    CycleDetected { connection: ConnectionId },

    /// The visit or wall-clock budget ran out
    #[error("query budget exhausted after {visited} connections")]
    Timeout { visited: u64 },

    /// A station id that is not part of the timetable
    #[error("unknown station {0}")]
    UnknownStation(StationId),

    /// A connection id that is not part of the timetable
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    /// Malformed query parameters
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A fold found no result for one of its candidates
    #[error("no result recorded for connection {0}")]
    Incomplete(ConnectionId),

    /// The worker pool could not be started
    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
}

/// Read-only view of a timetable plus the tunables to run queries with.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'a> {
    timetable: &'a Timetable,
    config: &'a EngineConfig,
}

impl<'a> Engine<'a> {
    pub fn new(timetable: &'a Timetable, config: &'a EngineConfig) -> Self {
        Self { timetable, config }
    }

    pub fn timetable(&self) -> &'a Timetable {
        self.timetable
    }

    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    /// Arrival distribution at `destination` after boarding `connection`,
    /// considering every later departure in the timetable.
    pub fn distribution_at(
        &self,
        connection: ConnectionId,
        destination: StationId,
    ) -> Result<Distribution, EngineError> {
        if self.timetable.connection(connection).is_none() {
            return Err(EngineError::UnknownConnection(connection));
        }
        self.check_station(destination)?;

        let memo = MemoTable::new();
        let budget = Budget::new(self.config.max_visits, self.config.timeout());
        let propagator = Propagator::new(
            self.timetable,
            self.config,
            &memo,
            &budget,
            destination,
            Mtime::MAX,
        );
        let result = propagator.distribution_at(connection)?;
        Ok(Distribution::clone(&result))
    }

    fn check_station(&self, station: StationId) -> Result<(), EngineError> {
        match self.timetable.station(station) {
            Some(_) => Ok(()),
            None => Err(EngineError::UnknownStation(station)),
        }
    }
}
