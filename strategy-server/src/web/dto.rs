//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::Distribution;
use crate::engine::DepartureOption;
use crate::graph::{Station, StationId, Timetable};

/// Request to compute a journey strategy.
#[derive(Debug, Deserialize)]
pub struct QueryApiRequest {
    /// Origin station code
    pub origin: String,

    /// Destination station code
    pub destination: String,

    /// Earliest departure, in minutes since the timetable epoch
    pub start: i32,

    /// Query horizon in minutes (defaults to the configured horizon)
    pub max_time: Option<i32>,
}

/// A station in the station list.
#[derive(Debug, Serialize)]
pub struct StationResult {
    pub code: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,

    /// Minimum transfer time, if the station overrides the default
    pub transfer_mins: Option<i32>,
}

impl StationResult {
    pub fn from_station(station: &Station) -> Self {
        Self {
            code: station.code.clone(),
            name: station.name.clone(),
            lat: station.lat,
            lon: station.lon,
            transfer_mins: station.transfer_mins,
        }
    }
}

/// Response listing all stations.
#[derive(Debug, Serialize)]
pub struct StationsResponse {
    pub stations: Vec<StationResult>,
}

/// An arrival distribution with summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionView {
    /// Minute of the first bucket
    pub start: i32,

    /// Per-minute probabilities
    pub masses: Vec<f64>,

    /// Expected arrival, conditional on arriving at all
    pub mean: Option<f64>,

    /// Probability of arriving within the horizon
    pub feasible_probability: f64,

    pub median: Option<i32>,
    pub p90: Option<i32>,
    pub p99: Option<i32>,
}

impl DistributionView {
    pub fn from_distribution(distribution: &Distribution) -> Self {
        let quantile = |q: f64| distribution.quantile(q).map(|t| t.minutes());
        Self {
            start: distribution.start().minutes(),
            masses: distribution.masses().to_vec(),
            mean: distribution.mean(),
            feasible_probability: distribution.total_mass(),
            median: quantile(0.5),
            p90: quantile(0.9),
            p99: quantile(0.99),
        }
    }
}

/// A way of leaving the origin that the strategy may take.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionView {
    /// Connection index in the timetable; absent when walking all the way
    pub connection: Option<usize>,

    /// Minutes walked before boarding, or to the destination
    pub walk_mins: i32,

    /// Route display name
    pub route: Option<String>,

    /// Next stop code
    pub to: String,

    /// Scheduled departure minute
    pub departure: Option<i32>,

    /// Scheduled arrival minute at the next stop
    pub arrival: Option<i32>,

    /// Probability that the strategy takes this option
    pub weight: f64,

    /// Expected arrival at the destination after taking this option
    pub mean_arrival: Option<f64>,

    pub track: Option<String>,
    pub message: Option<String>,
}

impl OptionView {
    pub fn from_option(timetable: &Timetable, destination: StationId, option: &DepartureOption) -> Self {
        let mut view = Self {
            connection: None,
            walk_mins: option.walk_mins,
            route: None,
            to: timetable[destination].code.clone(),
            departure: None,
            arrival: None,
            weight: option.weight,
            mean_arrival: option.distribution.mean(),
            track: None,
            message: None,
        };
        let Some(id) = option.connection else {
            return view;
        };

        let connection = &timetable[id];
        view.connection = Some(id.index());
        view.route = Some(timetable[connection.route].name.clone());
        view.to = timetable[connection.to].code.clone();
        view.departure = Some(connection.departure.scheduled.minutes());
        view.arrival = Some(connection.arrival.scheduled.minutes());
        view.track = connection
            .departure
            .projected_track
            .clone()
            .or_else(|| connection.departure.scheduled_track.clone());
        view.message = connection.message.clone();
        view
    }
}

/// Response to a strategy query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub origin: String,
    pub destination: String,
    pub start: i32,
    pub max_time: i32,

    /// Arrival at the destination under the best strategy
    pub distribution: DistributionView,

    /// Ways of leaving the origin in the order the strategy tries them
    pub options: Vec<OptionView>,

    /// Number of connections expanded
    pub visited: u64,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
