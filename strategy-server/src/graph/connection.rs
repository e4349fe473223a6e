//! Routes and the connections that run along them.

use super::{ConnectionId, RouteId, StationId, StopInfo, TripId};
use crate::domain::Distribution;

/// A physical line. Only its product type influences delays.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Arena index.
    pub id: RouteId,

    /// Feed identifier.
    pub code: String,

    /// Display name (e.g. "S1", "ICE 597").
    pub name: String,

    /// Vehicle category used to look up delay statistics.
    pub product_type: i16,
}

/// One scheduled vehicle leg between two consecutive stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// Arena index.
    pub id: ConnectionId,

    /// Route this leg belongs to.
    pub route: RouteId,

    /// Vehicle run this leg belongs to.
    pub trip: TripId,

    /// Departure station.
    pub from: StationId,

    /// Arrival station.
    pub to: StationId,

    /// Departure event at `from`.
    pub departure: StopInfo,

    /// Arrival event at `to`.
    pub arrival: StopInfo,

    /// Whether the whole leg is cancelled.
    pub cancelled: bool,

    /// Free-text service message.
    pub message: Option<String>,
}

impl Connection {
    /// True if the leg cannot be ridden: the leg itself or either stop is
    /// cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled || self.departure.cancelled || self.arrival.cancelled
    }

    /// Distribution of the actual arrival time at `to`.
    pub fn arrival_distribution(&self) -> Distribution {
        self.arrival.distribution()
    }

    /// True if `next` is the following leg of the same vehicle, so a
    /// traveler can stay seated instead of transferring.
    pub fn continues_into(&self, next: &Connection) -> bool {
        self.trip == next.trip
            && self.route == next.route
            && self.to == next.from
            && next.departure.scheduled >= self.arrival.scheduled
    }
}
