//! Engine configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Tunables for distribution propagation.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Minimum transfer time between two vehicles at the same station
    /// (minutes). Stations may override it.
    pub transfer_mins: i32,

    /// Longest footpath to consider for an interstation transfer (minutes).
    pub max_walk_mins: i32,

    /// Once the probability of still being without a connection drops below
    /// this, the remaining candidates are ignored.
    pub negligible_probability: f64,

    /// Default query horizon used when a caller doesn't give one (minutes).
    pub horizon_mins: i32,

    /// Maximum number of connections expanded per query.
    pub max_visits: Option<u64>,

    /// Wall-clock limit per query (milliseconds).
    pub timeout_ms: Option<u64>,

    /// Worker threads for seed evaluation. 0 uses every core, 1 runs on the
    /// calling thread.
    pub workers: usize,
}

impl EngineConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        transfer_mins: i32,
        max_walk_mins: i32,
        negligible_probability: f64,
        horizon_mins: i32,
        max_visits: Option<u64>,
        timeout_ms: Option<u64>,
        workers: usize,
    ) -> Self {
        Self {
            transfer_mins,
            max_walk_mins,
            negligible_probability,
            horizon_mins,
            max_visits,
            timeout_ms,
            workers,
        }
    }

    /// Defaults overlaid with `STRATEGY_*` environment variables.
    ///
    /// Unparsable or out-of-range values are logged and ignored: minute
    /// settings must not be negative and the negligible probability must lie
    /// in `[0, 1]`. `STRATEGY_MAX_VISITS=0` and `STRATEGY_TIMEOUT_MS=0`
    /// disable the respective budget.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let minutes = |m: &i32| *m >= 0;
        overlay(&lookup, "STRATEGY_TRANSFER_MINS", &mut config.transfer_mins, minutes);
        overlay(&lookup, "STRATEGY_MAX_WALK_MINS", &mut config.max_walk_mins, minutes);
        overlay(
            &lookup,
            "STRATEGY_NEGLIGIBLE_PROBABILITY",
            &mut config.negligible_probability,
            |p: &f64| (0.0..=1.0).contains(p),
        );
        overlay(&lookup, "STRATEGY_HORIZON_MINS", &mut config.horizon_mins, minutes);
        overlay(&lookup, "STRATEGY_WORKERS", &mut config.workers, any);

        let mut max_visits = config.max_visits.unwrap_or(0);
        overlay(&lookup, "STRATEGY_MAX_VISITS", &mut max_visits, any);
        config.max_visits = (max_visits > 0).then_some(max_visits);

        let mut timeout_ms = config.timeout_ms.unwrap_or(0);
        overlay(&lookup, "STRATEGY_TIMEOUT_MS", &mut timeout_ms, any);
        config.timeout_ms = (timeout_ms > 0).then_some(timeout_ms);

        config
    }

    /// Returns the wall-clock budget as a Duration.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transfer_mins: 1,
            max_walk_mins: 15,
            negligible_probability: 1e-3,
            horizon_mins: 1440, // 1 day
            max_visits: Some(1_000_000),
            timeout_ms: None,
            workers: 0,
        }
    }
}

fn any<T>(_: &T) -> bool {
    true
}

fn overlay<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
    in_range: impl Fn(&T) -> bool,
) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) if in_range(&value) => *slot = value,
        Ok(_) => warn!(key, value = %raw, "Ignoring out-of-range engine setting"),
        Err(_) => warn!(key, value = %raw, "Ignoring unparsable engine setting"),
    }
}
