//! Scheduled stop events and their delays.

use crate::domain::{Distribution, InvalidDistribution, Mtime};

/// Delay of a stop event, as minutes relative to the scheduled time.
#[derive(Debug, Clone, PartialEq)]
pub enum Delay {
    /// A known (or assumed) delay. `Fixed(0)` is an on-time stop.
    Fixed(i32),

    /// Uncertain delay: mass over offsets from the scheduled time.
    Distributed(Distribution),
}

impl Default for Delay {
    fn default() -> Self {
        Delay::Fixed(0)
    }
}

/// One scheduled departure or arrival of a connection.
#[derive(Debug, Clone, PartialEq)]
pub struct StopInfo {
    /// Timetabled time.
    pub scheduled: Mtime,

    /// Delay relative to `scheduled`.
    pub delay: Delay,

    /// Whether the vehicle skips this stop.
    pub cancelled: bool,

    /// Timetabled platform, if known.
    pub scheduled_track: Option<String>,

    /// Announced platform, if different from the timetable.
    pub projected_track: Option<String>,
}

impl StopInfo {
    /// An on-time stop at `scheduled`.
    pub fn on_time(scheduled: Mtime) -> Self {
        Self {
            scheduled,
            delay: Delay::Fixed(0),
            cancelled: false,
            scheduled_track: None,
            projected_track: None,
        }
    }

    /// A stop with a known delay in minutes.
    pub fn delayed(scheduled: Mtime, minutes: i32) -> Self {
        Self {
            delay: Delay::Fixed(minutes),
            ..Self::on_time(scheduled)
        }
    }

    /// A stop whose delay follows `delay`, given as offsets from `scheduled`.
    pub fn uncertain(scheduled: Mtime, delay: Distribution) -> Result<Self, InvalidDistribution> {
        delay.validate()?;
        Ok(Self {
            delay: Delay::Distributed(delay),
            ..Self::on_time(scheduled)
        })
    }

    /// Mark the stop as cancelled.
    pub fn cancelled(mut self) -> Self {
        self.cancelled = true;
        self
    }

    /// The distribution of the actual event time.
    pub fn distribution(&self) -> Distribution {
        match &self.delay {
            Delay::Fixed(minutes) => Distribution::point(self.scheduled + *minutes),
            Delay::Distributed(d) => d.shift(self.scheduled.minutes()),
        }
    }
}
