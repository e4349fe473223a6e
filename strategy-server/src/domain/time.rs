//! Timetable time handling.
//!
//! All schedule times are whole minutes relative to a fixed timetable epoch
//! (usually the start of the first service day). Journeys that run past
//! midnight simply keep counting upwards; there is no wraparound.

use std::fmt;
use std::ops::{Add, Sub};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: i32 = 24 * 60;

/// Minutes since the timetable epoch.
///
/// # Examples
///
/// ```
/// use strategy_server::domain::Mtime;
///
/// let t = Mtime::new(23 * 60 + 30);
/// assert_eq!(t.to_string(), "23:30");
///
/// // Crossing midnight keeps counting instead of wrapping.
/// let later = t + 45;
/// assert_eq!(later.minutes(), 24 * 60 + 15);
/// assert_eq!(later.to_string(), "00:15+1d");
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mtime(i32);

impl Mtime {
    /// The latest representable time. Used as an open horizon.
    pub const MAX: Mtime = Mtime(i32::MAX);

    /// The earliest representable time.
    pub const MIN: Mtime = Mtime(i32::MIN);

    /// Create a time from minutes since the epoch.
    pub const fn new(minutes: i32) -> Self {
        Self(minutes)
    }

    /// Returns minutes since the epoch.
    pub const fn minutes(self) -> i32 {
        self.0
    }

    /// Add minutes, returning `None` on overflow.
    pub fn checked_add(self, minutes: i32) -> Option<Self> {
        self.0.checked_add(minutes).map(Self)
    }

    /// Convert a unix timestamp (seconds) to minutes relative to `epoch_ts`.
    ///
    /// Seconds are rounded to the nearest minute.
    ///
    /// ```
    /// use strategy_server::domain::Mtime;
    ///
    /// assert_eq!(Mtime::from_unix(1_700_000_600, 1_700_000_000).minutes(), 10);
    /// assert_eq!(Mtime::from_unix(1_700_000_029, 1_700_000_000).minutes(), 0);
    /// assert_eq!(Mtime::from_unix(1_700_000_030, 1_700_000_000).minutes(), 1);
    /// ```
    pub fn from_unix(ts: i64, epoch_ts: i64) -> Self {
        let minutes = ((ts - epoch_ts) as f64 / 60.0).round();
        Self(minutes.clamp(i32::MIN as f64, i32::MAX as f64) as i32)
    }

    /// Convert back to a unix timestamp (seconds) given the epoch.
    pub fn to_unix(self, epoch_ts: i64) -> i64 {
        epoch_ts + i64::from(self.0) * 60
    }

    /// Returns the wall-clock instant this time denotes.
    pub fn to_datetime(self, epoch: DateTime<Utc>) -> Option<DateTime<Utc>> {
        epoch.checked_add_signed(Duration::minutes(i64::from(self.0)))
    }

    /// Returns the day offset from the epoch day (negative before it).
    pub fn day(self) -> i32 {
        self.0.div_euclid(MINUTES_PER_DAY)
    }

    /// Returns minutes past midnight within the day.
    pub fn minute_of_day(self) -> i32 {
        self.0.rem_euclid(MINUTES_PER_DAY)
    }
}

impl Add<i32> for Mtime {
    type Output = Mtime;

    fn add(self, rhs: i32) -> Self::Output {
        Mtime(self.0.saturating_add(rhs))
    }
}

impl Sub<i32> for Mtime {
    type Output = Mtime;

    fn sub(self, rhs: i32) -> Self::Output {
        Mtime(self.0.saturating_sub(rhs))
    }
}

/// Signed minutes between two times.
impl Sub<Mtime> for Mtime {
    type Output = i32;

    fn sub(self, rhs: Mtime) -> Self::Output {
        self.0.saturating_sub(rhs.0)
    }
}

impl From<i32> for Mtime {
    fn from(minutes: i32) -> Self {
        Self(minutes)
    }
}

impl fmt::Debug for Mtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mtime({})", self.0)
    }
}

impl fmt::Display for Mtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let of_day = self.minute_of_day();
        write!(f, "{:02}:{:02}", of_day / 60, of_day % 60)?;
        match self.day() {
            0 => Ok(()),
            d if d > 0 => write!(f, "+{d}d"),
            d => write!(f, "{d}d"),
        }
    }
}
