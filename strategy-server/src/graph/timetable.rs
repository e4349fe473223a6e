//! The loaded timetable and the builder that assembles it.
//!
//! A [`Timetable`] owns every station, route and connection in arena vectors.
//! Cross references are plain indices, so the graph may cycle freely without
//! any owning pointers. Once built the timetable is immutable; per-query state
//! lives in the engine.

use std::collections::HashMap;
use std::ops::Index;

use chrono::{DateTime, Utc};

use super::{
    Connection, ConnectionId, GraphError, Route, RouteId, Station, StationId, StopInfo, TripId,
};
use crate::domain::Mtime;
use crate::walkable::WalkableConnections;

/// A read-only transit network.
#[derive(Debug, Clone, Default)]
pub struct Timetable {
    stations: Vec<Station>,
    routes: Vec<Route>,
    connections: Vec<Connection>,
    by_code: HashMap<String, StationId>,
    walkable: WalkableConnections,
    epoch: Option<DateTime<Utc>>,
}

impl Timetable {
    /// Look up a station.
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.index())
    }

    /// Look up a route.
    pub fn route(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(id.index())
    }

    /// Look up a connection.
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id.index())
    }

    /// Find a station by its feed code.
    pub fn find_station(&self, code: &str) -> Option<StationId> {
        self.by_code.get(code).copied()
    }

    /// All stations, indexed by [`StationId`].
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// All routes, indexed by [`RouteId`].
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// All connections, indexed by [`ConnectionId`].
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Departures from `station` scheduled within `[from, to]`, in
    /// departure order.
    ///
    /// Unknown stations have no departures.
    pub fn departures_between(&self, station: StationId, from: Mtime, to: Mtime) -> &[ConnectionId] {
        let Some(station) = self.station(station) else {
            return &[];
        };
        let departures = &station.departures;
        let scheduled = |id: &ConnectionId| self.connections[id.index()].departure.scheduled;
        let lo = departures.partition_point(|id| scheduled(id) < from);
        let hi = departures.partition_point(|id| scheduled(id) <= to);
        if lo >= hi {
            return &[];
        }
        &departures[lo..hi]
    }

    /// Stations reachable on foot from `station`, with walking minutes.
    pub fn walkable_from(&self, station: StationId) -> &[(StationId, i32)] {
        self.walkable.walkable_from(station)
    }

    /// The footpath table.
    pub fn walkable(&self) -> &WalkableConnections {
        &self.walkable
    }

    /// Wall-clock instant of [`Mtime`] zero, if the feed provided one.
    pub fn epoch(&self) -> Option<DateTime<Utc>> {
        self.epoch
    }

    /// Number of stations.
    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// Number of connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Index<StationId> for Timetable {
    type Output = Station;

    fn index(&self, id: StationId) -> &Station {
        &self.stations[id.index()]
    }
}

impl Index<RouteId> for Timetable {
    type Output = Route;

    fn index(&self, id: RouteId) -> &Route {
        &self.routes[id.index()]
    }
}

impl Index<ConnectionId> for Timetable {
    type Output = Connection;

    fn index(&self, id: ConnectionId) -> &Connection {
        &self.connections[id.index()]
    }
}

/// Everything needed to add one connection.
#[derive(Debug, Clone)]
pub struct ConnectionSpec {
    pub route: RouteId,
    pub trip: TripId,
    pub from: StationId,
    pub to: StationId,
    pub departure: StopInfo,
    pub arrival: StopInfo,
    pub cancelled: bool,
    pub message: Option<String>,
}

impl ConnectionSpec {
    /// A running (not cancelled) leg.
    pub fn new(
        route: RouteId,
        trip: TripId,
        from: StationId,
        to: StationId,
        departure: StopInfo,
        arrival: StopInfo,
    ) -> Self {
        Self {
            route,
            trip,
            from,
            to,
            departure,
            arrival,
            cancelled: false,
            message: None,
        }
    }

    /// Mark the whole leg as cancelled.
    pub fn cancelled(mut self) -> Self {
        self.cancelled = true;
        self
    }

    /// Attach a service message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Incrementally assembles a [`Timetable`].
///
/// Every connection is registered in its origin's departures and its
/// destination's arrivals at the same time, so the two lists always agree.
///
/// # Examples
///
/// ```
/// use strategy_server::domain::Mtime;
/// use strategy_server::graph::{ConnectionSpec, StopInfo, TimetableBuilder};
///
/// let mut builder = TimetableBuilder::new();
/// let a = builder.add_station("A", "Alpha").unwrap();
/// let b = builder.add_station("B", "Beta").unwrap();
/// let route = builder.add_route("S1", "S1", 0);
/// let trip = builder.new_trip();
/// builder
///     .add_connection(ConnectionSpec::new(
///         route,
///         trip,
///         a,
///         b,
///         StopInfo::on_time(Mtime::new(0)),
///         StopInfo::on_time(Mtime::new(10)),
///     ))
///     .unwrap();
///
/// let timetable = builder.build();
/// assert_eq!(timetable.find_station("B"), Some(b));
/// assert_eq!(timetable[a].departures.len(), 1);
/// assert_eq!(timetable[b].arrivals.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct TimetableBuilder {
    timetable: Timetable,
    next_trip: usize,
}

impl TimetableBuilder {
    /// Start an empty timetable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a station. Codes must be unique.
    pub fn add_station(
        &mut self,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<StationId, GraphError> {
        let code = code.into();
        if self.timetable.by_code.contains_key(&code) {
            return Err(GraphError::DuplicateStation(code));
        }
        let id = StationId(self.timetable.stations.len());
        self.timetable.by_code.insert(code.clone(), id);
        self.timetable
            .stations
            .push(Station::new(id, code, name.into()));
        Ok(id)
    }

    /// Find a station added so far by its code.
    pub fn find_station(&self, code: &str) -> Option<StationId> {
        self.timetable.find_station(code)
    }

    /// Set a station's coordinates.
    pub fn set_location(&mut self, station: StationId, lat: f64, lon: f64) -> Result<(), GraphError> {
        let station = self.station_mut(station)?;
        station.lat = lat;
        station.lon = lon;
        Ok(())
    }

    /// Override the minimum transfer time at a station.
    pub fn set_transfer_mins(&mut self, station: StationId, minutes: i32) -> Result<(), GraphError> {
        self.station_mut(station)?.transfer_mins = Some(minutes);
        Ok(())
    }

    /// Add a route.
    pub fn add_route(
        &mut self,
        code: impl Into<String>,
        name: impl Into<String>,
        product_type: i16,
    ) -> RouteId {
        let id = RouteId(self.timetable.routes.len());
        self.timetable.routes.push(Route {
            id,
            code: code.into(),
            name: name.into(),
            product_type,
        });
        id
    }

    /// Allocate a fresh trip identifier.
    pub fn new_trip(&mut self) -> TripId {
        let id = TripId(self.next_trip);
        self.next_trip += 1;
        id
    }

    /// Add a connection and register it with both of its stations.
    pub fn add_connection(&mut self, spec: ConnectionSpec) -> Result<ConnectionId, GraphError> {
        self.station_mut(spec.from)?;
        self.station_mut(spec.to)?;
        if self.timetable.route(spec.route).is_none() {
            return Err(GraphError::UnknownRoute(spec.route));
        }
        if spec.from == spec.to {
            return Err(GraphError::SelfLoop(spec.from));
        }
        let minutes = spec.arrival.scheduled - spec.departure.scheduled;
        if minutes < 0 {
            return Err(GraphError::NegativeTravelTime {
                from: spec.from,
                to: spec.to,
                minutes: -minutes,
            });
        }

        let id = ConnectionId(self.timetable.connections.len());
        self.timetable.stations[spec.from.index()].departures.push(id);
        self.timetable.stations[spec.to.index()].arrivals.push(id);
        self.timetable.connections.push(Connection {
            id,
            route: spec.route,
            trip: spec.trip,
            from: spec.from,
            to: spec.to,
            departure: spec.departure,
            arrival: spec.arrival,
            cancelled: spec.cancelled,
            message: spec.message,
        });
        Ok(id)
    }

    /// Add a symmetric footpath between two stations.
    pub fn add_footpath(&mut self, a: StationId, b: StationId, minutes: i32) -> Result<(), GraphError> {
        self.station_mut(a)?;
        self.station_mut(b)?;
        if a == b || minutes <= 0 {
            return Err(GraphError::InvalidFootpath(a, b));
        }
        self.timetable.walkable.add(a, b, minutes);
        Ok(())
    }

    /// Set the wall-clock instant of [`Mtime`] zero.
    pub fn set_epoch(&mut self, epoch: DateTime<Utc>) {
        self.timetable.epoch = Some(epoch);
    }

    /// Finish the timetable, sorting each station's departures and arrivals
    /// by scheduled time and then by connection id.
    pub fn build(self) -> Timetable {
        let mut timetable = self.timetable;
        let connections = &timetable.connections;
        for station in &mut timetable.stations {
            station
                .departures
                .sort_by_key(|id| (connections[id.index()].departure.scheduled, *id));
            station
                .arrivals
                .sort_by_key(|id| (connections[id.index()].arrival.scheduled, *id));
        }
        timetable
    }

    fn station_mut(&mut self, id: StationId) -> Result<&mut Station, GraphError> {
        self.timetable
            .stations
            .get_mut(id.index())
            .ok_or(GraphError::UnknownStation(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(m: i32) -> Mtime {
        Mtime::new(m)
    }

    struct Fixture {
        builder: TimetableBuilder,
        a: StationId,
        b: StationId,
        c: StationId,
        route: RouteId,
    }

    fn fixture() -> Fixture {
        let mut builder = TimetableBuilder::new();
        let a = builder.add_station("A", "Alpha").unwrap();
        let b = builder.add_station("B", "Beta").unwrap();
        let c = builder.add_station("C", "Gamma").unwrap();
        let route = builder.add_route("R", "Regional", 3);
        Fixture {
            builder,
            a,
            b,
            c,
            route,
        }
    }

    fn leg(f: &mut Fixture, from: StationId, to: StationId, dep: i32, arr: i32) -> ConnectionId {
        let trip = f.builder.new_trip();
        f.builder
            .add_connection(ConnectionSpec::new(
                f.route,
                trip,
                from,
                to,
                StopInfo::on_time(t(dep)),
                StopInfo::on_time(t(arr)),
            ))
            .unwrap()
    }

    #[test]
    fn duplicate_station_rejected() {
        let mut f = fixture();
        assert_eq!(
            f.builder.add_station("A", "Again"),
            Err(GraphError::DuplicateStation("A".into()))
        );
    }

    #[test]
    fn departures_and_arrivals_sorted() {
        let mut f = fixture();
        let (a, b, c) = (f.a, f.b, f.c);
        let late = leg(&mut f, a, b, 30, 40);
        let early = leg(&mut f, a, c, 10, 20);
        let tie = leg(&mut f, a, b, 10, 15);
        let tt = f.builder.build();

        assert_eq!(tt[a].departures, vec![early, tie, late]);
        assert_eq!(tt[b].arrivals, vec![tie, late]);
        assert_eq!(tt[c].arrivals, vec![early]);
    }

    #[test]
    fn departures_and_arrivals_agree() {
        let mut f = fixture();
        let (a, b, c) = (f.a, f.b, f.c);
        leg(&mut f, a, b, 0, 10);
        leg(&mut f, b, c, 10, 20);
        leg(&mut f, c, a, 20, 30);
        let tt = f.builder.build();

        for conn in tt.connections() {
            assert!(tt[conn.from].departures.contains(&conn.id));
            assert!(tt[conn.to].arrivals.contains(&conn.id));
        }
    }

    #[test]
    fn departures_between_is_inclusive() {
        let mut f = fixture();
        let (a, b) = (f.a, f.b);
        let c0 = leg(&mut f, a, b, 0, 5);
        let c10 = leg(&mut f, a, b, 10, 15);
        let c20 = leg(&mut f, a, b, 20, 25);
        let tt = f.builder.build();

        assert_eq!(tt.departures_between(a, t(0), t(10)), &[c0, c10]);
        assert_eq!(tt.departures_between(a, t(1), t(20)), &[c10, c20]);
        assert!(tt.departures_between(a, t(21), t(100)).is_empty());
        assert!(tt.departures_between(a, t(15), t(5)).is_empty());
        assert!(tt.departures_between(StationId(99), t(0), t(100)).is_empty());
    }

    #[test]
    fn rejects_bad_connections() {
        let mut f = fixture();
        let trip = f.builder.new_trip();
        let spec = |from, to, dep, arr| {
            ConnectionSpec::new(
                f.route,
                trip,
                from,
                to,
                StopInfo::on_time(t(dep)),
                StopInfo::on_time(t(arr)),
            )
        };

        let self_loop = spec(f.a, f.a, 0, 10);
        let backwards = spec(f.a, f.b, 10, 4);
        let unknown = spec(f.a, StationId(42), 0, 10);
        let mut bad_route = spec(f.a, f.b, 0, 10);
        bad_route.route = RouteId(9);

        assert_eq!(
            f.builder.add_connection(self_loop),
            Err(GraphError::SelfLoop(f.a))
        );
        assert_eq!(
            f.builder.add_connection(backwards),
            Err(GraphError::NegativeTravelTime {
                from: f.a,
                to: f.b,
                minutes: 6
            })
        );
        assert_eq!(
            f.builder.add_connection(unknown),
            Err(GraphError::UnknownStation(StationId(42)))
        );
        assert_eq!(
            f.builder.add_connection(bad_route),
            Err(GraphError::UnknownRoute(RouteId(9)))
        );
        assert_eq!(f.builder.build().connection_count(), 0);
    }

    #[test]
    fn footpaths() {
        let mut f = fixture();
        f.builder.add_footpath(f.a, f.b, 4).unwrap();
        assert_eq!(
            f.builder.add_footpath(f.a, f.a, 4),
            Err(GraphError::InvalidFootpath(f.a, f.a))
        );
        assert_eq!(
            f.builder.add_footpath(f.a, f.c, 0),
            Err(GraphError::InvalidFootpath(f.a, f.c))
        );
        let (a, b) = (f.a, f.b);
        let tt = f.builder.build();
        assert_eq!(tt.walkable_from(a), &[(b, 4)]);
        assert_eq!(tt.walkable_from(b), &[(a, 4)]);
    }

    #[test]
    fn station_metadata() {
        let mut f = fixture();
        f.builder.set_location(f.a, 52.5, 13.4).unwrap();
        f.builder.set_transfer_mins(f.b, 6).unwrap();
        assert!(f.builder.set_transfer_mins(StationId(7), 1).is_err());
        let (a, b) = (f.a, f.b);
        let tt = f.builder.build();

        assert_eq!(tt[a].lat, 52.5);
        assert_eq!(tt[a].lon, 13.4);
        assert_eq!(tt[b].transfer_buffer(1), 6);
        assert_eq!(tt.find_station("C"), Some(StationId(2)));
        assert_eq!(tt.find_station("Z"), None);
        assert_eq!(tt.station_count(), 3);
    }

    #[test]
    fn connection_spec_builders() {
        let spec = ConnectionSpec::new(
            RouteId(0),
            TripId(0),
            StationId(0),
            StationId(1),
            StopInfo::on_time(t(0)),
            StopInfo::on_time(t(1)),
        )
        .cancelled()
        .with_message("engineering works");
        assert!(spec.cancelled);
        assert_eq!(spec.message.as_deref(), Some("engineering works"));
    }
}
