//! Conversion from feed documents to the graph model.
//!
//! Stop delays are resolved in order: an explicit distribution, then the
//! delay model entry matching the route's product type and the reported
//! delay, and finally the reported delay itself (or none). Model entries are
//! shifted by the reported delay. A reported delay for an event at or before
//! the document's `now` is taken as final.

use std::ops::Range;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::delays::{Conditions, DelayModel, Observation, StopKind};
use crate::domain::{Distribution, InvalidDistribution, Mtime};
use crate::graph::{ConnectionSpec, Delay, StopInfo, Timetable, TimetableBuilder};

use super::error::FeedError;
use super::types::{DelayModelDoc, DistributionDoc, RangeDoc, StopDoc, TimetableDoc};

/// Build a timetable from a parsed document.
pub fn build_timetable(doc: &TimetableDoc, delays: &DelayModel) -> Result<Timetable, FeedError> {
    let mut builder = TimetableBuilder::new();
    if let Some(epoch) = doc.epoch {
        let epoch = DateTime::<Utc>::from_timestamp(epoch, 0).ok_or(FeedError::InvalidEpoch(epoch))?;
        builder.set_epoch(epoch);
    }
    let now = match (doc.now, doc.now_unix) {
        (None, None) => None,
        (minutes, unix) => Some(
            resolve_time(minutes, unix, doc.epoch).ok_or_else(|| FeedError::MissingTime("now".into()))?,
        ),
    };

    for station in &doc.stations {
        let id = builder.add_station(&station.id, &station.name)?;
        if let (Some(lat), Some(lon)) = (station.lat, station.lon) {
            builder.set_location(id, lat, lon)?;
        }
        if let Some(minutes) = station.transfer_mins {
            builder.set_transfer_mins(id, minutes)?;
        }
    }
    let lookup = |code: &str, builder: &TimetableBuilder| {
        builder
            .find_station(code)
            .ok_or_else(|| FeedError::UnknownStation(code.to_string()))
    };

    let mut connections = 0;
    for route in &doc.routes {
        let route_id = builder.add_route(&route.id, &route.name, route.product_type);
        for (trip_idx, trip) in route.trips.iter().enumerate() {
            let trip_id = builder.new_trip();
            for (conn_idx, conn) in trip.connections.iter().enumerate() {
                let context = format!("route {} trip {trip_idx} connection {conn_idx}", route.id);
                let from = lookup(&conn.from, &builder)?;
                let to = lookup(&conn.to, &builder)?;
                let resolve = |stop: &StopDoc, kind: StopKind, label: &str| {
                    let context = format!("{context} {label}");
                    let scheduled = resolve_time(stop.scheduled, stop.scheduled_unix, doc.epoch)
                        .ok_or_else(|| FeedError::MissingTime(context.clone()))?;
                    let delay = match &stop.delay_distribution {
                        Some(dist) => Delay::Distributed(convert_distribution(dist).map_err(|source| {
                            FeedError::Distribution { context, source }
                        })?),
                        None => modelled_delay(delays, route.product_type, kind, scheduled, stop.delay, now),
                    };
                    Ok::<_, FeedError>(StopInfo {
                        scheduled,
                        delay,
                        cancelled: stop.cancelled,
                        scheduled_track: stop.scheduled_track.clone(),
                        projected_track: stop.projected_track.clone(),
                    })
                };
                let departure = resolve(&conn.departure, StopKind::Departure, "departure")?;
                let arrival = resolve(&conn.arrival, StopKind::Arrival, "arrival")?;

                let mut spec = ConnectionSpec::new(route_id, trip_id, from, to, departure, arrival);
                spec.cancelled = conn.cancelled;
                spec.message = conn.message.clone();
                builder.add_connection(spec)?;
                connections += 1;
            }
        }
    }

    for path in &doc.footpaths {
        let from = lookup(&path.from, &builder)?;
        let to = lookup(&path.to, &builder)?;
        builder.add_footpath(from, to, path.minutes)?;
    }

    debug!(
        stations = doc.stations.len(),
        routes = doc.routes.len(),
        connections,
        footpaths = doc.footpaths.len(),
        now = ?now,
        "converted timetable document"
    );
    Ok(builder.build())
}

/// Build a delay model from a parsed document.
pub fn build_delay_model(doc: &DelayModelDoc) -> Result<DelayModel, FeedError> {
    let mut model = DelayModel::new();
    for entry in &doc.entries {
        let context = format!("product type {} {:?}", entry.product_type, entry.kind);
        let invalid = |source: InvalidDistribution| FeedError::Distribution {
            context: context.clone(),
            source,
        };
        let conditions = Conditions {
            prior_delay: convert_range(entry.prior_delay.as_ref(), "prior_delay", &context)?,
            time_to_event: convert_range(entry.time_to_event.as_ref(), "time_to_event", &context)?,
        };
        match (&entry.distribution, &entry.buckets) {
            (Some(dist), _) => {
                let delay = convert_distribution(dist).map_err(invalid)?;
                model
                    .insert(entry.product_type, entry.kind, conditions, delay)
                    .map_err(invalid)?;
            }
            (None, Some(buckets)) => {
                let ranges: Vec<_> = buckets.iter().map(|b| (b.from..b.to, b.count)).collect();
                let total = entry
                    .total_samples
                    .unwrap_or_else(|| buckets.iter().fold(0u64, |sum, b| sum.saturating_add(b.count)));
                model
                    .insert_from_buckets(entry.product_type, entry.kind, conditions, &ranges, total)
                    .map_err(invalid)?;
            }
            (None, None) => return Err(FeedError::MissingDelay(context)),
        }
    }
    for fallback in &doc.fallback {
        let invalid = |source: InvalidDistribution| FeedError::Distribution {
            context: format!("fallback {:?}", fallback.kind),
            source,
        };
        let delay = convert_distribution(&fallback.distribution).map_err(invalid)?;
        model.set_fallback(fallback.kind, delay).map_err(invalid)?;
    }
    Ok(model)
}

fn resolve_time(minutes: Option<i32>, unix: Option<i64>, epoch: Option<i64>) -> Option<Mtime> {
    match (minutes, unix, epoch) {
        (Some(minutes), _, _) => Some(Mtime::new(minutes)),
        (None, Some(ts), Some(epoch)) => Some(Mtime::from_unix(ts, epoch)),
        _ => None,
    }
}

fn modelled_delay(
    delays: &DelayModel,
    product_type: i16,
    kind: StopKind,
    scheduled: Mtime,
    reported: Option<i32>,
    now: Option<Mtime>,
) -> Delay {
    let shift = reported.unwrap_or(0);
    let observation = Observation {
        reported_delay: reported,
        time_to_event: now.map(|now| (scheduled + shift) - now),
    };
    if let (Some(minutes), Some(lead)) = (reported, observation.time_to_event) {
        if lead <= 0 {
            return Delay::Fixed(minutes);
        }
    }
    match delays.distribution_for(product_type, kind, &observation) {
        Some(model) => Delay::Distributed(model.shift(shift)),
        None => Delay::Fixed(shift),
    }
}

fn convert_range(
    range: Option<&RangeDoc>,
    field: &'static str,
    context: &str,
) -> Result<Option<Range<i32>>, FeedError> {
    match range {
        None => Ok(None),
        Some(r) if r.from < r.to => Ok(Some(r.from..r.to)),
        Some(r) => Err(FeedError::EmptyRange {
            context: context.to_string(),
            field,
            from: r.from,
            to: r.to,
        }),
    }
}

fn convert_distribution(doc: &DistributionDoc) -> Result<Distribution, InvalidDistribution> {
    Distribution::from_masses(Mtime::new(doc.start), doc.masses.clone())
}
