//! Query orchestration: seeding the propagation from the origin.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use super::budget::Budget;
use super::memo::MemoTable;
use super::propagate::{Candidate, Propagator};
use super::{Engine, EngineError};
use crate::domain::{Distribution, Mtime};
use crate::graph::{ConnectionId, StationId};

/// A journey question: leave `origin` no earlier than `start`, board the
/// first vehicle within `max_time` minutes, arrive at `destination`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRequest {
    pub origin: StationId,
    pub destination: StationId,
    pub start: Mtime,

    /// Length of the query horizon in minutes. Bounds both the departures
    /// considered at the origin and every onward departure.
    pub max_time: i32,
}

impl QueryRequest {
    pub fn new(origin: StationId, destination: StationId, start: Mtime, max_time: i32) -> Self {
        Self {
            origin,
            destination,
            start,
            max_time,
        }
    }

    /// Last scheduled departure time inside the horizon.
    pub fn horizon_end(&self) -> Mtime {
        self.start + self.max_time
    }
}

/// A way of leaving the origin that the strategy may take.
#[derive(Debug, Clone, PartialEq)]
pub struct DepartureOption {
    /// Connection boarded, or `None` when walking straight to the
    /// destination.
    pub connection: Option<ConnectionId>,

    /// Minutes walked first: to the boarding station, or all the way.
    pub walk_mins: i32,

    /// Arrival at the destination after boarding this departure.
    pub distribution: Arc<Distribution>,

    /// Probability that the strategy boards this departure.
    pub weight: f64,
}

/// Answer to a [`QueryRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// Arrival time at the destination. Missing mass is the probability of
    /// not arriving within the horizon.
    pub distribution: Distribution,

    /// Ways of leaving the origin in the order the strategy tries them. Only
    /// those with a positive probability of being taken are listed.
    pub options: Vec<DepartureOption>,

    /// Connections expanded.
    pub visited: u64,

    /// Distinct results recorded in the memo.
    pub memoized: usize,
}

impl Engine<'_> {
    /// Best-strategy arrival distribution from `request.origin`.
    pub fn query(&self, request: &QueryRequest) -> Result<QueryOutcome, EngineError> {
        self.check_station(request.origin)?;
        self.check_station(request.destination)?;
        if request.max_time < 0 {
            return Err(EngineError::InvalidQuery(format!(
                "negative max_time {}",
                request.max_time
            )));
        }

        if request.origin == request.destination {
            return Ok(QueryOutcome {
                distribution: Distribution::point(request.start),
                options: Vec::new(),
                visited: 0,
                memoized: 0,
            });
        }

        let memo = MemoTable::new();
        let budget = Budget::new(self.config.max_visits, self.config.timeout());
        let propagator = Propagator::new(
            self.timetable,
            self.config,
            &memo,
            &budget,
            request.destination,
            request.horizon_end(),
        );

        let mut seeds: Vec<Candidate> = self
            .timetable
            .departures_between(request.origin, request.start, request.horizon_end())
            .iter()
            .filter(|id| !self.timetable[**id].is_cancelled())
            .map(|id| Candidate::Board {
                connection: *id,
                transfer: Some(0),
            })
            .collect();
        seeds.extend(propagator.walks_from(request.origin, request.start));

        self.evaluate_seeds(&propagator, &seeds)?;

        let folded = propagator.fold(&Distribution::point(request.start), request.start, &seeds)?;
        let options = folded
            .steps
            .into_iter()
            .map(|step| DepartureOption {
                connection: step.candidate.connection(),
                walk_mins: match step.candidate {
                    Candidate::Board { transfer, .. } => transfer.unwrap_or(0),
                    Candidate::Walk { minutes } => minutes,
                },
                distribution: step.distribution,
                weight: step.weight,
            })
            .collect();

        let outcome = QueryOutcome {
            distribution: folded.distribution,
            options,
            visited: budget.visited(),
            memoized: memo.len(),
        };
        debug!(
            origin = %request.origin,
            destination = %request.destination,
            start = %request.start,
            seeds = seeds.len(),
            visited = outcome.visited,
            memoized = outcome.memoized,
            feasible = outcome.distribution.total_mass(),
            "query complete"
        );
        Ok(outcome)
    }

    /// Fill the memo for every seed, on the worker pool when there is more
    /// than one seed and parallelism is enabled.
    ///
    /// Workers share the memo, so a sub-journey claimed by one worker is
    /// computed once and awaited by the others. The final fold reads the memo
    /// in seed order, which keeps the result independent of scheduling.
    fn evaluate_seeds(&self, propagator: &Propagator<'_>, seeds: &[Candidate]) -> Result<(), EngineError> {
        let run = |seed: &Candidate| match seed.connection() {
            Some(connection) => propagator.distribution_at(connection).map(drop),
            None => Ok(()),
        };

        if self.config.workers == 1 || seeds.len() < 2 {
            return seeds.iter().try_for_each(run);
        }
        if self.config.workers == 0 {
            return seeds.par_iter().try_for_each(run);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .map_err(|e| EngineError::WorkerPool(e.to_string()))?;
        pool.install(|| seeds.par_iter().try_for_each(run))
    }
}
