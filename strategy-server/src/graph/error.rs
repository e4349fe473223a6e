//! Timetable construction errors.

use super::{RouteId, StationId};

/// Errors raised while assembling a [`Timetable`](super::Timetable).
///
/// These reject data that would break the graph invariants the engine relies
/// on; they are distinct from ingestion (parse/IO) errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Two stations share a code
    #[error("duplicate station code {0}")]
    DuplicateStation(String),

    /// A connection or footpath refers to a station that was never added
    #[error("unknown station {0}")]
    UnknownStation(StationId),

    /// A connection refers to a route that was never added
    #[error("unknown route {0}")]
    UnknownRoute(RouteId),

    /// A connection departs from and arrives at the same station
    #[error("connection from {0} to itself")]
    SelfLoop(StationId),

    /// Scheduled arrival precedes scheduled departure
    #[error("connection from {from} to {to} arrives {minutes} min before it departs")]
    NegativeTravelTime {
        from: StationId,
        to: StationId,
        minutes: i32,
    },

    /// Footpath with a non-positive duration or between a station and itself
    #[error("invalid footpath between {0} and {1}")]
    InvalidFootpath(StationId, StationId),
}
