//! Stations and their sorted departure/arrival lists.

use super::{ConnectionId, StationId};

/// A stop place in the network.
///
/// `departures` and `arrivals` are non-owning references into the
/// timetable's connection arena, sorted by scheduled time and then by
/// connection id.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Arena index.
    pub id: StationId,

    /// Feed identifier, unique within a timetable.
    pub code: String,

    /// Display name.
    pub name: String,

    /// Latitude in degrees.
    pub lat: f64,

    /// Longitude in degrees.
    pub lon: f64,

    /// Minimum transfer time at this station, overriding the global default.
    pub transfer_mins: Option<i32>,

    /// Connections leaving this station.
    pub departures: Vec<ConnectionId>,

    /// Connections arriving at this station.
    pub arrivals: Vec<ConnectionId>,
}

impl Station {
    pub(super) fn new(id: StationId, code: String, name: String) -> Self {
        Self {
            id,
            code,
            name,
            lat: 0.0,
            lon: 0.0,
            transfer_mins: None,
            departures: Vec::new(),
            arrivals: Vec::new(),
        }
    }

    /// The transfer buffer to apply here, given the global default.
    pub fn transfer_buffer(&self, default_mins: i32) -> i32 {
        self.transfer_mins.unwrap_or(default_mins)
    }
}
