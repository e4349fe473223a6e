//! Domain types for stochastic journey planning.
//!
//! This module contains the value types everything else is built on:
//! timetable time and discrete arrival-time distributions. Constructors
//! validate their invariants, so code that receives these types can trust
//! them.

mod distribution;
mod time;

pub use distribution::{Distribution, InvalidDistribution, MASS_TOLERANCE, MAX_BUCKET_SPAN};
pub use time::Mtime;
