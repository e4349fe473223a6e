//! Arena indices for timetable entities.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            /// Returns the arena index.
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

arena_id!(
    /// Index of a [`Station`](super::Station) in its timetable.
    StationId,
    "S"
);
arena_id!(
    /// Index of a [`Route`](super::Route) in its timetable.
    RouteId,
    "R"
);
arena_id!(
    /// Index of a [`Connection`](super::Connection) in its timetable.
    ConnectionId,
    "C"
);
arena_id!(
    /// Identifies one vehicle run along a route.
    ///
    /// Consecutive connections sharing a trip are legs of the same vehicle.
    TripId,
    "T"
);
