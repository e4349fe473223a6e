//! Delay statistics per product type.
//!
//! The delay model is produced elsewhere (from historic observations) and
//! consumed during ingestion. Entries are keyed by product type and stop kind,
//! and may be narrowed to the delay already reported for the stop and to how
//! far ahead of the event that report was made. Distributions here are
//! offsets from the projected time, i.e. scheduled plus reported delay.

use std::collections::HashMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::domain::{Distribution, InvalidDistribution};

/// Which end of a connection a delay applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    Departure,
    Arrival,
}

/// The situation a delay entry was measured in. `None` matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Conditions {
    /// Reported delay in minutes.
    pub prior_delay: Option<Range<i32>>,

    /// Minutes between the report and the projected event.
    pub time_to_event: Option<Range<i32>>,
}

impl Conditions {
    /// Entry that applies regardless of what has been reported.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_prior_delay(mut self, minutes: Range<i32>) -> Self {
        self.prior_delay = Some(minutes);
        self
    }

    pub fn with_time_to_event(mut self, minutes: Range<i32>) -> Self {
        self.time_to_event = Some(minutes);
        self
    }

    /// Number of narrowed dimensions, if the observation falls inside them.
    fn specificity(&self, observation: &Observation) -> Option<usize> {
        let within = |range: &Option<Range<i32>>, value: Option<i32>| match (range, value) {
            (None, _) => Some(0),
            (Some(range), Some(value)) if range.contains(&value) => Some(1),
            (Some(_), _) => None,
        };
        Some(
            within(&self.prior_delay, observation.reported_delay)?
                + within(&self.time_to_event, observation.time_to_event)?,
        )
    }
}

/// What is known about a stop when its delay is looked up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Observation {
    /// Delay reported for the stop, if any.
    pub reported_delay: Option<i32>,

    /// Minutes from the report to the projected event, if the report time is
    /// known.
    pub time_to_event: Option<i32>,
}

/// Delay distributions keyed by product type, stop kind and conditions.
#[derive(Debug, Clone, Default)]
pub struct DelayModel {
    by_product: HashMap<(i16, StopKind), Vec<(Conditions, Distribution)>>,
    fallback: HashMap<StopKind, Distribution>,
}

impl DelayModel {
    /// An empty model. Every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the delay distribution for a product type under `conditions`,
    /// replacing any entry with the same key.
    pub fn insert(
        &mut self,
        product_type: i16,
        kind: StopKind,
        conditions: Conditions,
        delay: Distribution,
    ) -> Result<(), InvalidDistribution> {
        delay.validate()?;
        let entries = self.by_product.entry((product_type, kind)).or_default();
        match entries.iter_mut().find(|(existing, _)| *existing == conditions) {
            Some((_, slot)) => *slot = delay,
            None => entries.push((conditions, delay)),
        }
        Ok(())
    }

    /// Record a distribution built from delay sample counts.
    ///
    /// See [`Distribution::from_buckets`].
    pub fn insert_from_buckets(
        &mut self,
        product_type: i16,
        kind: StopKind,
        conditions: Conditions,
        buckets: &[(Range<i32>, u64)],
        total_samples: u64,
    ) -> Result<(), InvalidDistribution> {
        let delay = Distribution::from_buckets(buckets, total_samples)?;
        self.insert(product_type, kind, conditions, delay)
    }

    /// Distribution used for product types without a matching entry.
    pub fn set_fallback(&mut self, kind: StopKind, delay: Distribution) -> Result<(), InvalidDistribution> {
        delay.validate()?;
        self.fallback.insert(kind, delay);
        Ok(())
    }

    /// The delay distribution for a stop.
    ///
    /// Among the product's entries whose conditions hold, the one narrowed in
    /// the most dimensions wins, earlier entries winning ties. Without a
    /// match the per-kind fallback applies.
    pub fn distribution_for(
        &self,
        product_type: i16,
        kind: StopKind,
        observation: &Observation,
    ) -> Option<&Distribution> {
        let mut best: Option<(usize, &Distribution)> = None;
        for (conditions, delay) in self.by_product.get(&(product_type, kind)).into_iter().flatten() {
            if let Some(score) = conditions.specificity(observation) {
                if best.is_none_or(|(top, _)| score > top) {
                    best = Some((score, delay));
                }
            }
        }
        best.map(|(_, delay)| delay).or_else(|| self.fallback.get(&kind))
    }

    /// Number of product-specific entries.
    pub fn len(&self) -> usize {
        self.by_product.values().map(Vec::len).sum()
    }

    /// True if there are neither product entries nor fallbacks.
    pub fn is_empty(&self) -> bool {
        self.by_product.is_empty() && self.fallback.is_empty()
    }
}
