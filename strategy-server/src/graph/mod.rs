//! Transit graph model.
//!
//! Stations, routes and connections are stored in arenas owned by a
//! [`Timetable`] and refer to each other by index. The engine only ever reads
//! the graph.

mod connection;
mod error;
mod ids;
mod station;
mod stop;
mod timetable;

pub use connection::{Connection, Route};
pub use error::GraphError;
pub use ids::{ConnectionId, RouteId, StationId, TripId};
pub use station::Station;
pub use stop::{Delay, StopInfo};
pub use timetable::{ConnectionSpec, Timetable, TimetableBuilder};
