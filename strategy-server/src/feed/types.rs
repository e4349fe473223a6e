//! JSON document types for timetables and delay models.
//!
//! A timetable document lists stations, then routes, each with its trips in
//! order and each trip with its consecutive connections. Optional fields may
//! be omitted entirely.

use serde::{Deserialize, Serialize};

use crate::delays::StopKind;

/// Root of a timetable document.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TimetableDoc {
    /// Unix timestamp (seconds) of minute zero.
    #[serde(default)]
    pub epoch: Option<i64>,

    /// When the reported delays were current, in minutes since the epoch.
    #[serde(default)]
    pub now: Option<i32>,

    /// Same as `now`, as a unix timestamp (seconds). Needs `epoch`.
    #[serde(default)]
    pub now_unix: Option<i64>,

    pub stations: Vec<StationDoc>,

    #[serde(default)]
    pub routes: Vec<RouteDoc>,

    #[serde(default)]
    pub footpaths: Vec<FootpathDoc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StationDoc {
    /// Unique station code.
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub lat: Option<f64>,

    #[serde(default)]
    pub lon: Option<f64>,

    /// Minimum transfer time at this station (minutes).
    #[serde(default)]
    pub transfer_mins: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteDoc {
    pub id: String,

    pub name: String,

    /// Vehicle category; keys the delay model.
    #[serde(default)]
    pub product_type: i16,

    #[serde(default)]
    pub trips: Vec<TripDoc>,
}

/// One vehicle run: its connections in travel order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TripDoc {
    pub connections: Vec<ConnectionDoc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionDoc {
    /// Departure station code.
    pub from: String,

    /// Arrival station code.
    pub to: String,

    pub departure: StopDoc,

    pub arrival: StopDoc,

    #[serde(default)]
    pub cancelled: bool,

    #[serde(default)]
    pub message: Option<String>,
}

/// A departure or arrival event.
///
/// The scheduled time is either `scheduled` (minutes since the epoch) or
/// `scheduled_unix` (seconds), the latter requiring a document epoch.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StopDoc {
    #[serde(default)]
    pub scheduled: Option<i32>,

    #[serde(default)]
    pub scheduled_unix: Option<i64>,

    /// Reported delay in minutes.
    #[serde(default)]
    pub delay: Option<i32>,

    /// Delay distribution as offsets from the scheduled time. Takes
    /// precedence over `delay` and the delay model.
    #[serde(default)]
    pub delay_distribution: Option<DistributionDoc>,

    #[serde(default)]
    pub cancelled: bool,

    #[serde(default)]
    pub scheduled_track: Option<String>,

    #[serde(default)]
    pub projected_track: Option<String>,
}

/// Dense histogram: `masses[i]` is the mass at minute `start + i`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DistributionDoc {
    pub start: i32,
    pub masses: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FootpathDoc {
    pub from: String,
    pub to: String,
    pub minutes: i32,
}

/// Root of a delay model document.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DelayModelDoc {
    #[serde(default)]
    pub entries: Vec<DelayEntryDoc>,

    #[serde(default)]
    pub fallback: Vec<FallbackDoc>,
}

/// Delays for one product type at one stop kind, given either as a
/// distribution or as sample counts, as offsets from the projected time.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DelayEntryDoc {
    pub product_type: i16,

    pub kind: StopKind,

    /// Reported delays this entry was measured under.
    #[serde(default)]
    pub prior_delay: Option<RangeDoc>,

    /// Report lead times (minutes before the projected event) this entry was
    /// measured under.
    #[serde(default)]
    pub time_to_event: Option<RangeDoc>,

    #[serde(default)]
    pub distribution: Option<DistributionDoc>,

    #[serde(default)]
    pub buckets: Option<Vec<BucketDoc>>,

    #[serde(default)]
    pub total_samples: Option<u64>,
}

/// Minutes in `[from, to)`. Must not be empty.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RangeDoc {
    pub from: i32,
    pub to: i32,
}

/// `count` samples with a delay in `[from, to)` minutes. An empty range
/// counts samples that never arrived.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BucketDoc {
    pub from: i32,
    pub to: i32,
    pub count: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FallbackDoc {
    pub kind: StopKind,
    pub distribution: DistributionDoc,
}
