//! Backward propagation of destination-arrival distributions.
//!
//! For a boarded connection `c`, the traveler alights at `c.to` and then
//! tries the onward departures in order of expected arrival at the
//! destination. Each one is caught with some probability; the traveler falls
//! through to the next only after missing every better one. The arrival
//! distribution for `c` is the resulting mixture.
//!
//! The search is depth-first over an explicit stack. Every onward departure
//! leaves no earlier than `c` arrives, so the search only moves forward in
//! scheduled time; a connection that shows up again while it is still being
//! expanded can only come from a zero-duration loop and fails the query.
//! Workers of one query claim connections in the shared memo before
//! expanding them, so each connection is expanded and charged once.

use std::sync::Arc;

use tracing::trace;

use super::budget::Budget;
use super::memo::{Claim, MemoTable, Worker};
use super::reachability::reachable_probability;
use super::{EngineConfig, EngineError};
use crate::domain::{Distribution, Mtime};
use crate::graph::{Connection, ConnectionId, StationId, Timetable};

/// A way onward considered after alighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Candidate {
    /// Board a departure.
    Board {
        connection: ConnectionId,

        /// Minutes needed before the departure. `None` when the traveler
        /// stays on the same vehicle.
        transfer: Option<i32>,
    },

    /// Walk the rest of the way to the destination.
    Walk { minutes: i32 },
}

impl Candidate {
    pub fn connection(&self) -> Option<ConnectionId> {
        match self {
            Candidate::Board { connection, .. } => Some(*connection),
            Candidate::Walk { .. } => None,
        }
    }

    /// Tie-break among equal means: boarding before walking, then by id.
    fn order_key(&self) -> (bool, Option<ConnectionId>) {
        (matches!(self, Candidate::Walk { .. }), self.connection())
    }
}

/// One candidate's share of a fold.
#[derive(Debug, Clone)]
pub(crate) struct FoldStep {
    pub candidate: Candidate,
    pub weight: f64,
    pub distribution: Arc<Distribution>,
}

/// Result of folding a candidate list.
#[derive(Debug, Clone)]
pub(crate) struct Folded {
    pub distribution: Distribution,
    pub steps: Vec<FoldStep>,
}

/// A connection whose onward candidates are being expanded.
struct Frame {
    connection: ConnectionId,
    candidates: Vec<Candidate>,
    next: usize,
}

/// Computes distributions for one destination within one query.
///
/// Shares its memo and budget with every other worker of the query.
pub(crate) struct Propagator<'a> {
    timetable: &'a Timetable,
    config: &'a EngineConfig,
    memo: &'a MemoTable,
    budget: &'a Budget,
    destination: StationId,
    horizon_end: Mtime,
}

impl<'a> Propagator<'a> {
    pub fn new(
        timetable: &'a Timetable,
        config: &'a EngineConfig,
        memo: &'a MemoTable,
        budget: &'a Budget,
        destination: StationId,
        horizon_end: Mtime,
    ) -> Self {
        Self {
            timetable,
            config,
            memo,
            budget,
            destination,
            horizon_end,
        }
    }

    /// Arrival distribution at the destination after boarding `root`.
    ///
    /// The result and every intermediate result are stored in the memo. On
    /// failure the memo is marked failed so that other workers stop waiting.
    pub fn distribution_at(&self, root: ConnectionId) -> Result<Arc<Distribution>, EngineError> {
        self.expand(root).inspect_err(|err| self.memo.fail(err.clone()))
    }

    fn expand(&self, root: ConnectionId) -> Result<Arc<Distribution>, EngineError> {
        let worker = self.memo.worker();
        if let Some(done) = self.enter(root, worker)? {
            return Ok(done);
        }

        let mut stack = vec![self.frame(root)];
        while let Some(frame) = stack.last_mut() {
            if let Some(candidate) = frame.candidates.get(frame.next).copied() {
                frame.next += 1;
                if let Some(child) = candidate.connection() {
                    if self.enter(child, worker)?.is_none() {
                        stack.push(self.frame(child));
                    }
                }
                continue;
            }

            let Some(frame) = stack.pop() else {
                break;
            };
            let connection = &self.timetable[frame.connection];
            let arrival = connection.arrival_distribution();
            let folded = self.fold(&arrival, connection.arrival.scheduled, &frame.candidates)?;
            let stored = self
                .memo
                .insert(frame.connection, self.destination, folded.distribution);
            if stack.is_empty() {
                return Ok(stored);
            }
        }

        Err(EngineError::Incomplete(root))
    }

    /// The finished result for `id`, or `None` once `worker` has claimed it
    /// and must expand it. Each claim is charged to the budget exactly once.
    fn enter(&self, id: ConnectionId, worker: Worker) -> Result<Option<Arc<Distribution>>, EngineError> {
        if let Some(done) = self.resolved(id)? {
            return Ok(Some(done));
        }
        match self.memo.claim(id, self.destination, worker)? {
            Claim::Done(done) => Ok(Some(done)),
            Claim::Cycle => Err(EngineError::CycleDetected { connection: id }),
            Claim::Owned => {
                self.budget.charge()?;
                Ok(None)
            }
        }
    }

    /// Memoized or terminal result for `id`, if it needs no expansion.
    fn resolved(&self, id: ConnectionId) -> Result<Option<Arc<Distribution>>, EngineError> {
        if let Some(done) = self.memo.get(id, self.destination) {
            return Ok(Some(done));
        }
        let connection = &self.timetable[id];
        if connection.is_cancelled() {
            let never = Distribution::empty(connection.arrival.scheduled);
            return Ok(Some(self.memo.insert(id, self.destination, never)));
        }
        if connection.to == self.destination {
            let arrival = connection.arrival_distribution();
            arrival.validate()?;
            return Ok(Some(self.memo.insert(id, self.destination, arrival)));
        }
        Ok(None)
    }

    fn frame(&self, id: ConnectionId) -> Frame {
        Frame {
            connection: id,
            candidates: self.candidates(&self.timetable[id]),
            next: 0,
        }
    }

    /// Onward candidates after alighting from `connection`.
    ///
    /// Departures at the same station leave at or after the scheduled
    /// arrival; departures from a walkable neighbour leave at or after the
    /// scheduled arrival plus the walk. All leave no later than the horizon
    /// and none is cancelled. A destination within walking distance adds a
    /// walk.
    pub fn candidates(&self, connection: &Connection) -> Vec<Candidate> {
        let timetable = self.timetable;
        let arrived = connection.arrival.scheduled;
        let default_buffer = timetable[connection.to].transfer_buffer(self.config.transfer_mins);

        let mut candidates: Vec<Candidate> = timetable
            .departures_between(connection.to, arrived, self.horizon_end)
            .iter()
            .map(|id| &timetable[*id])
            .filter(|next| !next.is_cancelled())
            .map(|next| Candidate::Board {
                connection: next.id,
                transfer: (!connection.continues_into(next)).then_some(default_buffer),
            })
            .collect();
        candidates.extend(self.walks_from(connection.to, arrived));
        candidates
    }

    /// Candidates reached on foot from `station` when leaving it at `from`.
    pub fn walks_from(&self, station: StationId, from: Mtime) -> Vec<Candidate> {
        let timetable = self.timetable;
        let mut candidates = Vec::new();
        for &(neighbour, walk) in timetable.walkable_from(station) {
            if walk > self.config.max_walk_mins {
                continue;
            }
            if neighbour == self.destination {
                candidates.push(Candidate::Walk { minutes: walk });
                continue;
            }
            candidates.extend(
                timetable
                    .departures_between(neighbour, from + walk, self.horizon_end)
                    .iter()
                    .filter(|id| !timetable[**id].is_cancelled())
                    .map(|id| Candidate::Board {
                        connection: *id,
                        transfer: Some(walk),
                    }),
            );
        }
        candidates
    }

    /// Fold memoized candidate results into one distribution.
    ///
    /// Candidates are tried by ascending mean arrival, ties broken by
    /// connection id with walks last. Each gets the probability of catching
    /// it times the probability of having missed every earlier one; a walk is
    /// always possible. Candidates without any arrival mass are skipped.
    pub fn fold(
        &self,
        arrival: &Distribution,
        anchor: Mtime,
        candidates: &[Candidate],
    ) -> Result<Folded, EngineError> {
        let mut ranked = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let distribution = match *candidate {
                Candidate::Board { connection, .. } => self
                    .memo
                    .get(connection, self.destination)
                    .ok_or(EngineError::Incomplete(connection))?,
                Candidate::Walk { minutes } => Arc::new(arrival.shift(minutes)),
            };
            if let Some(mean) = distribution.mean() {
                ranked.push((mean, *candidate, distribution));
            }
        }
        ranked.sort_by(|(ma, a, _), (mb, b, _)| {
            ma.total_cmp(mb).then_with(|| a.order_key().cmp(&b.order_key()))
        });

        let mut result = Distribution::empty(anchor);
        let mut steps = Vec::new();
        let mut remaining = 1.0;
        for (mean, candidate, distribution) in ranked {
            if remaining < self.config.negligible_probability {
                break;
            }
            let reach = match candidate {
                Candidate::Board {
                    connection,
                    transfer: Some(buffer),
                } => reachable_probability(arrival, buffer, &self.timetable[connection].departure),
                Candidate::Board { transfer: None, .. } | Candidate::Walk { .. } => 1.0,
            };
            let weight = reach * remaining;
            trace!(
                candidate = ?candidate,
                mean,
                reach,
                weight,
                "fold step"
            );
            if weight <= 0.0 {
                continue;
            }
            result.accumulate(&distribution, weight);
            remaining -= weight;
            steps.push(FoldStep {
                candidate,
                weight,
                distribution,
            });
        }

        result.validate()?;
        Ok(Folded {
            distribution: result,
            steps,
        })
    }
}
