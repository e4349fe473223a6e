//! Discrete arrival-time distributions.
//!
//! A [`Distribution`] is a histogram of probability mass over one-minute
//! buckets, anchored at a start time. The masses never sum to more than one;
//! whatever is missing is the probability of never arriving (for example
//! because the strategy runs out of options within the query horizon).

use std::ops::Range;

use super::Mtime;

/// Numerical slack accepted when validating probability mass.
///
/// Negative masses no smaller than `-MASS_TOLERANCE` are clamped to zero and
/// totals up to `1 + MASS_TOLERANCE` are accepted. Anything beyond is an error.
pub const MASS_TOLERANCE: f64 = 1e-6;

/// Widest histogram [`Distribution::from_buckets`] accepts, in minutes.
pub const MAX_BUCKET_SPAN: i64 = 7 * 24 * 60;

/// Error returned when probability mass violates the distribution invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidDistribution {
    /// A bucket carries negative mass
    #[error("negative probability mass {mass} at {time}")]
    NegativeMass { time: Mtime, mass: f64 },

    /// A bucket carries NaN or infinite mass
    #[error("non-finite probability mass at {time}")]
    NonFiniteMass { time: Mtime },

    /// The masses add up to more than one
    #[error("total probability mass {total} exceeds 1")]
    ExcessMass { total: f64 },

    /// Mixture weights are negative or add up to more than one
    #[error("invalid mixture weights {p1} and {p2}")]
    InvalidWeights { p1: f64, p2: f64 },

    /// A histogram was requested from zero samples
    #[error("cannot build a distribution from zero samples")]
    NoSamples,

    /// Bucket counts add up to more than the sample total
    #[error("bucket counts {counted} exceed the {total} samples taken")]
    ExcessSamples { counted: u64, total: u64 },

    /// Histogram buckets cover more minutes than [`MAX_BUCKET_SPAN`]
    #[error("histogram span {from}..{to} is wider than one week")]
    SpanTooWide { from: i32, to: i32 },
}

/// Probability mass over one-minute buckets starting at `start`.
///
/// # Examples
///
/// ```
/// use strategy_server::domain::{Distribution, Mtime};
///
/// let d = Distribution::uniform(Mtime::new(10), 4);
/// assert_eq!(d.mean(), Some(11.5));
/// assert_eq!(d.cdf(Mtime::new(11)), 0.5);
///
/// let later = d.shift(5);
/// assert_eq!(later.start(), Mtime::new(15));
/// assert_eq!(later.total_mass(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    start: Mtime,
    masses: Vec<f64>,
}

impl Distribution {
    /// A distribution with no assigned mass: the traveler never arrives.
    pub fn empty(start: Mtime) -> Self {
        Self {
            start,
            masses: Vec::new(),
        }
    }

    /// All mass at a single time.
    pub fn point(at: Mtime) -> Self {
        Self {
            start: at,
            masses: vec![1.0],
        }
    }

    /// Equal mass over `width` consecutive minutes starting at `start`.
    pub fn uniform(start: Mtime, width: usize) -> Self {
        if width == 0 {
            return Self::empty(start);
        }
        Self {
            start,
            masses: vec![1.0 / width as f64; width],
        }
    }

    /// Build a distribution from explicit bucket masses.
    ///
    /// Fails when a mass is non-finite, negative beyond [`MASS_TOLERANCE`],
    /// or when the total exceeds one beyond the tolerance.
    pub fn from_masses(start: Mtime, mut masses: Vec<f64>) -> Result<Self, InvalidDistribution> {
        let mut total = 0.0;
        for (i, mass) in masses.iter_mut().enumerate() {
            let time = start + i as i32;
            if !mass.is_finite() {
                return Err(InvalidDistribution::NonFiniteMass { time });
            }
            if *mass < 0.0 {
                if *mass < -MASS_TOLERANCE {
                    return Err(InvalidDistribution::NegativeMass { time, mass: *mass });
                }
                *mass = 0.0;
            }
            total += *mass;
        }
        if total > 1.0 + MASS_TOLERANCE {
            return Err(InvalidDistribution::ExcessMass { total });
        }
        Ok(Self { start, masses })
    }

    /// Build a delay distribution from sample counts over minute ranges.
    ///
    /// Each `(range, count)` spreads `count / total_samples` uniformly across
    /// the half-open range of delay minutes. Empty ranges stand for samples
    /// that never arrived and only contribute to the failure probability, as
    /// does any part of `total_samples` not covered by a bucket.
    ///
    /// ```
    /// use strategy_server::domain::{Distribution, Mtime};
    ///
    /// let d = Distribution::from_buckets(&[(0..2, 60), (2..3, 30), (0..0, 10)], 100).unwrap();
    /// assert_eq!(d.start(), Mtime::new(0));
    /// assert_eq!(d.masses(), &[0.3, 0.3, 0.3]);
    /// assert!((d.failure_probability() - 0.1).abs() < 1e-12);
    /// ```
    pub fn from_buckets(
        buckets: &[(Range<i32>, u64)],
        total_samples: u64,
    ) -> Result<Self, InvalidDistribution> {
        if total_samples == 0 {
            return Err(InvalidDistribution::NoSamples);
        }
        let counted = buckets
            .iter()
            .fold(0u64, |acc, (_, count)| acc.saturating_add(*count));
        if counted > total_samples {
            return Err(InvalidDistribution::ExcessSamples {
                counted,
                total: total_samples,
            });
        }
        let spans = || buckets.iter().filter(|(range, _)| range.start < range.end);
        let (Some(lo), Some(hi)) = (
            spans().map(|(r, _)| r.start).min(),
            spans().map(|(r, _)| r.end).max(),
        ) else {
            return Ok(Self::empty(Mtime::new(0)));
        };

        let span = i64::from(hi) - i64::from(lo);
        if span > MAX_BUCKET_SPAN {
            return Err(InvalidDistribution::SpanTooWide { from: lo, to: hi });
        }

        let mut masses = vec![0.0; span as usize];
        for (range, count) in spans() {
            let width = (i64::from(range.end) - i64::from(range.start)) as f64;
            let each = *count as f64 / width / total_samples as f64;
            let offset = (i64::from(range.start) - i64::from(lo)) as usize;
            for slot in &mut masses[offset..offset + width as usize] {
                *slot += each;
            }
        }
        Self::from_masses(Mtime::new(lo), masses)
    }

    /// Check the invariants without modifying the distribution.
    pub fn validate(&self) -> Result<(), InvalidDistribution> {
        let mut total = 0.0;
        for (time, mass) in self.iter() {
            if !mass.is_finite() {
                return Err(InvalidDistribution::NonFiniteMass { time });
            }
            if mass < -MASS_TOLERANCE {
                return Err(InvalidDistribution::NegativeMass { time, mass });
            }
            total += mass;
        }
        if total > 1.0 + MASS_TOLERANCE {
            return Err(InvalidDistribution::ExcessMass { total });
        }
        Ok(())
    }

    /// Time of the first bucket.
    pub fn start(&self) -> Mtime {
        self.start
    }

    /// Time one past the last bucket.
    pub fn end(&self) -> Mtime {
        self.start + self.masses.len() as i32
    }

    /// Bucket masses, one per minute from `start`.
    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    /// Iterate over `(time, mass)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Mtime, f64)> + '_ {
        self.masses
            .iter()
            .enumerate()
            .map(|(i, mass)| (self.start + i as i32, *mass))
    }

    /// Mass at exactly `time`.
    pub fn mass_at(&self, time: Mtime) -> f64 {
        if time < self.start {
            return 0.0;
        }
        let idx = (time - self.start) as usize;
        self.masses.get(idx).copied().unwrap_or(0.0)
    }

    /// Total assigned mass: the probability of arriving at all.
    pub fn total_mass(&self) -> f64 {
        self.masses.iter().sum()
    }

    /// Probability of never arriving.
    pub fn failure_probability(&self) -> f64 {
        (1.0 - self.total_mass()).max(0.0)
    }

    /// Returns true if any mass is assigned.
    pub fn has_mass(&self) -> bool {
        self.masses.iter().any(|m| *m > 0.0)
    }

    /// Expected arrival time given that the traveler arrives at all.
    ///
    /// Returns `None` when no mass is assigned.
    pub fn mean(&self) -> Option<f64> {
        let total = self.total_mass();
        if total <= 0.0 {
            return None;
        }
        let offset: f64 = self
            .masses
            .iter()
            .enumerate()
            .map(|(i, mass)| i as f64 * mass)
            .sum();
        Some(f64::from(self.start.minutes()) + offset / total)
    }

    /// Probability of arriving at or before `time`.
    pub fn cdf(&self, time: Mtime) -> f64 {
        if time < self.start || self.masses.is_empty() {
            return 0.0;
        }
        let last = ((time - self.start) as usize).min(self.masses.len() - 1);
        self.masses[..=last].iter().sum()
    }

    /// Earliest time by which the cumulative mass reaches `q`.
    ///
    /// Returns `None` when the distribution never reaches `q`, which happens
    /// whenever `q` exceeds the total mass.
    pub fn quantile(&self, q: f64) -> Option<Mtime> {
        let mut cumulative = 0.0;
        for (time, mass) in self.iter() {
            cumulative += mass;
            if cumulative >= q - 1e-12 {
                return Some(time);
            }
        }
        None
    }

    /// Every bucket moved by `delta` minutes; masses unchanged.
    pub fn shift(&self, delta: i32) -> Self {
        Self {
            start: self.start + delta,
            masses: self.masses.clone(),
        }
    }

    /// Drop all mass strictly before `time`. The dropped mass becomes failure.
    pub fn truncate_before(&self, time: Mtime) -> Self {
        if time <= self.start {
            return self.clone();
        }
        if time >= self.end() {
            return Self::empty(time);
        }
        let skip = (time - self.start) as usize;
        Self {
            start: time,
            masses: self.masses[skip..].to_vec(),
        }
    }

    /// Pointwise weighted sum `p1 * d1 + p2 * d2`.
    ///
    /// Weights must be non-negative with `p1 + p2 <= 1`; the remainder is
    /// mass that arrives via neither branch.
    ///
    /// ```
    /// use strategy_server::domain::{Distribution, Mtime};
    ///
    /// let early = Distribution::point(Mtime::new(20));
    /// let late = Distribution::point(Mtime::new(40));
    /// let mixed = Distribution::mixture(&early, 0.5, &late, 0.5).unwrap();
    /// assert_eq!(mixed.mass_at(Mtime::new(20)), 0.5);
    /// assert_eq!(mixed.mass_at(Mtime::new(40)), 0.5);
    /// assert_eq!(mixed.mean(), Some(30.0));
    /// ```
    pub fn mixture(
        d1: &Distribution,
        p1: f64,
        d2: &Distribution,
        p2: f64,
    ) -> Result<Self, InvalidDistribution> {
        let weight_ok = |p: f64| p.is_finite() && p >= 0.0;
        if !weight_ok(p1) || !weight_ok(p2) || p1 + p2 > 1.0 + MASS_TOLERANCE {
            return Err(InvalidDistribution::InvalidWeights { p1, p2 });
        }
        let mut mixed = Self::empty(d1.start);
        mixed.accumulate(d1, p1);
        mixed.accumulate(d2, p2);
        Ok(mixed)
    }

    /// Add `weight * other` into this distribution in place.
    ///
    /// The caller guarantees the accumulated weights stay within one.
    /// Zero weights and empty distributions leave `self` untouched.
    pub fn accumulate(&mut self, other: &Distribution, weight: f64) {
        if weight == 0.0 || other.masses.is_empty() {
            return;
        }
        if self.masses.is_empty() {
            self.start = other.start;
            self.masses = other.masses.iter().map(|m| m * weight).collect();
            return;
        }

        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        if start < self.start {
            let mut widened = vec![0.0; (self.start - start) as usize];
            widened.extend_from_slice(&self.masses);
            self.masses = widened;
            self.start = start;
        }
        self.masses.resize((end - start) as usize, 0.0);

        let offset = (other.start - start) as usize;
        for (i, mass) in other.masses.iter().enumerate() {
            self.masses[offset + i] += mass * weight;
        }
    }

    /// Probability that `X + offset <= Y` for independent `X ~ self` and
    /// `Y ~ other`.
    ///
    /// With `self` an arrival and `other` a departure, this is the chance of
    /// being on the platform `offset` minutes before the vehicle leaves.
    pub fn before_probability(&self, other: &Distribution, offset: i32) -> f64 {
        if self.masses.is_empty() || other.masses.is_empty() {
            return 0.0;
        }
        let mut cumulative = Vec::with_capacity(self.masses.len());
        let mut running = 0.0;
        for mass in &self.masses {
            running += mass;
            cumulative.push(running);
        }

        let mut p = 0.0;
        for (departure, y) in other.iter() {
            if y == 0.0 {
                continue;
            }
            let latest = departure - offset;
            if latest < self.start {
                continue;
            }
            let idx = ((latest - self.start) as usize).min(cumulative.len() - 1);
            p += y * cumulative[idx];
        }
        p.min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(m: i32) -> Mtime {
        Mtime::new(m)
    }

    #[test]
    fn empty_has_no_mass() {
        let d = Distribution::empty(t(5));
        assert!(!d.has_mass());
        assert_eq!(d.total_mass(), 0.0);
        assert_eq!(d.failure_probability(), 1.0);
        assert_eq!(d.mean(), None);
        assert_eq!(d.start(), t(5));
        assert_eq!(d.end(), t(5));
    }

    #[test]
    fn uniform_zero_width_is_empty() {
        assert_eq!(Distribution::uniform(t(3), 0), Distribution::empty(t(3)));
    }

    #[test]
    fn uniform_mean() {
        assert_eq!(Distribution::uniform(t(2), 4).mean(), Some(3.5));
        assert_eq!(Distribution::uniform(t(-2), 4).mean(), Some(-0.5));
        assert_eq!(Distribution::point(t(7)).mean(), Some(7.0));
    }

    #[test]
    fn mean_is_conditional_on_arrival() {
        let d = Distribution::from_masses(t(10), vec![0.25, 0.0, 0.25]).unwrap();
        assert_eq!(d.mean(), Some(11.0));
        assert_eq!(d.failure_probability(), 0.5);
    }

    #[test]
    fn from_masses_rejects_negative() {
        let err = Distribution::from_masses(t(0), vec![0.5, -0.1]).unwrap_err();
        assert!(matches!(err, InvalidDistribution::NegativeMass { time, .. } if time == t(1)));
    }

    #[test]
    fn from_masses_clamps_tiny_negative() {
        let d = Distribution::from_masses(t(0), vec![0.5, -1e-9]).unwrap();
        assert_eq!(d.masses(), &[0.5, 0.0]);
    }

    #[test]
    fn from_masses_rejects_excess() {
        let err = Distribution::from_masses(t(0), vec![0.6, 0.6]).unwrap_err();
        assert!(matches!(err, InvalidDistribution::ExcessMass { .. }));
    }

    #[test]
    fn from_masses_accepts_rounding_excess() {
        assert!(Distribution::from_masses(t(0), vec![0.5, 0.5 + 1e-9]).is_ok());
    }

    #[test]
    fn from_masses_rejects_nan() {
        let err = Distribution::from_masses(t(0), vec![f64::NAN]).unwrap_err();
        assert_eq!(err, InvalidDistribution::NonFiniteMass { time: t(0) });
    }

    #[test]
    fn from_buckets_spreads_counts() {
        let d = Distribution::from_buckets(&[(-2..0, 40), (0..1, 60)], 100).unwrap();
        assert_eq!(d.start(), t(-2));
        assert_eq!(d.masses(), &[0.2, 0.2, 0.6]);
    }

    #[test]
    fn from_buckets_requires_samples() {
        assert_eq!(
            Distribution::from_buckets(&[(0..1, 1)], 0).unwrap_err(),
            InvalidDistribution::NoSamples
        );
    }

    #[test]
    fn from_buckets_only_cancellations() {
        let d = Distribution::from_buckets(&[(0..0, 5)], 5).unwrap();
        assert!(!d.has_mass());
    }

    #[test]
    fn from_buckets_rejects_overcount() {
        let err = Distribution::from_buckets(&[(0..1, 10)], 5).unwrap_err();
        assert_eq!(
            err,
            InvalidDistribution::ExcessSamples {
                counted: 10,
                total: 5
            }
        );
    }

    #[test]
    fn from_buckets_rejects_overcounted_cancellations() {
        let err = Distribution::from_buckets(&[(0..0, 7), (3..3, 2)], 5).unwrap_err();
        assert!(matches!(
            err,
            InvalidDistribution::ExcessSamples { counted: 9, .. }
        ));
    }

    #[test]
    fn from_buckets_rejects_extreme_ranges() {
        let err = Distribution::from_buckets(&[(i32::MIN..i32::MAX, 1)], 1).unwrap_err();
        assert_eq!(
            err,
            InvalidDistribution::SpanTooWide {
                from: i32::MIN,
                to: i32::MAX
            }
        );

        let split = Distribution::from_buckets(&[(i32::MIN..i32::MIN + 1, 1), (0..1, 1)], 2);
        assert!(matches!(split, Err(InvalidDistribution::SpanTooWide { .. })));
    }

    #[test]
    fn from_buckets_accepts_widest_span() {
        let width = MAX_BUCKET_SPAN as i32;
        let d = Distribution::from_buckets(&[(0..width, 1)], 1).unwrap();
        assert_eq!(d.masses().len(), MAX_BUCKET_SPAN as usize);
        assert!((d.total_mass() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn validate_detects_bad_state() {
        let mut d = Distribution::point(t(0));
        d.accumulate(&Distribution::point(t(1)), 0.5);
        assert!(matches!(
            d.validate(),
            Err(InvalidDistribution::ExcessMass { .. })
        ));
        assert!(Distribution::uniform(t(0), 3).validate().is_ok());
    }

    #[test]
    fn shift_moves_start() {
        let d = Distribution::uniform(t(-5), 2).shift(3);
        assert_eq!(d.start(), t(-2));
        assert_eq!(d.masses(), &[0.5, 0.5]);
    }

    #[test]
    fn truncate_before() {
        let d = Distribution::uniform(t(10), 4);
        let cut = d.truncate_before(t(12));
        assert_eq!(cut.start(), t(12));
        assert_eq!(cut.masses(), &[0.25, 0.25]);
        assert_eq!(d.truncate_before(t(0)), d);
        assert!(!d.truncate_before(t(20)).has_mass());
    }

    #[test]
    fn accumulate_overlapping() {
        let mut a = Distribution::uniform(t(5), 2);
        a.accumulate(&Distribution::uniform(t(6), 4), 0.5);
        assert_eq!(a.start(), t(5));
        assert_eq!(a.masses(), &[0.5, 0.625, 0.125, 0.125, 0.125]);
    }

    #[test]
    fn accumulate_apart() {
        let mut a = Distribution::uniform(t(5), 2);
        a.accumulate(&Distribution::uniform(t(8), 2), 0.5);
        assert_eq!(a.masses(), &[0.5, 0.5, 0.0, 0.25, 0.25]);
    }

    #[test]
    fn accumulate_earlier_other() {
        let mut a = Distribution::point(t(10));
        a.accumulate(&Distribution::point(t(8)), 1.0);
        assert_eq!(a.start(), t(8));
        assert_eq!(a.masses(), &[1.0, 0.0, 1.0]);
    }

    #[test]
    fn accumulate_into_empty_adopts_anchor() {
        let mut a = Distribution::empty(t(0));
        a.accumulate(&Distribution::point(t(30)), 0.25);
        assert_eq!(a.start(), t(30));
        assert_eq!(a.masses(), &[0.25]);
    }

    #[test]
    fn mixture_rejects_bad_weights() {
        let d = Distribution::point(t(0));
        assert!(Distribution::mixture(&d, 0.7, &d, 0.7).is_err());
        assert!(Distribution::mixture(&d, -0.1, &d, 0.5).is_err());
        assert!(Distribution::mixture(&d, f64::NAN, &d, 0.0).is_err());
    }

    #[test]
    fn mixture_identity_weight() {
        let d = Distribution::uniform(t(3), 3);
        let other = Distribution::uniform(t(100), 5);
        assert_eq!(Distribution::mixture(&d, 1.0, &other, 0.0).unwrap(), d);
    }

    #[test]
    fn cdf() {
        let d = Distribution::uniform(t(10), 4);
        assert_eq!(d.cdf(t(9)), 0.0);
        assert_eq!(d.cdf(t(10)), 0.25);
        assert_eq!(d.cdf(t(13)), 1.0);
        assert_eq!(d.cdf(t(1000)), 1.0);
        assert_eq!(Distribution::empty(t(0)).cdf(t(10)), 0.0);
    }

    #[test]
    fn quantile() {
        let d = Distribution::from_masses(t(0), vec![0.25, 0.25, 0.25]).unwrap();
        assert_eq!(d.quantile(0.25), Some(t(0)));
        assert_eq!(d.quantile(0.5), Some(t(1)));
        assert_eq!(d.quantile(0.75), Some(t(2)));
        assert_eq!(d.quantile(0.9), None);
    }

    #[test]
    fn before_apart() {
        let a = Distribution::uniform(t(5), 2);
        let b = Distribution::uniform(t(8), 2);
        assert_eq!(a.before_probability(&b, 0), 1.0);
        assert_eq!(a.before_probability(&b, 2), 1.0);
        assert_eq!(a.before_probability(&b, 3), 0.75);
        assert_eq!(a.before_probability(&b, 4), 0.25);
        assert_eq!(a.before_probability(&b, 5), 0.0);
    }

    #[test]
    fn before_overlap() {
        let a = Distribution::uniform(t(5), 2);
        let b = Distribution::uniform(t(6), 2);
        assert_eq!(a.before_probability(&b, 0), 1.0);
        assert_eq!(a.before_probability(&b, 1), 0.75);
        assert_eq!(a.before_probability(&b, 2), 0.25);
        assert_eq!(a.before_probability(&b, 3), 0.0);
    }

    #[test]
    fn before_triangle() {
        let a = Distribution::from_masses(t(5), vec![0.2, 0.6, 0.2]).unwrap();
        let b = Distribution::from_masses(t(6), vec![0.2, 0.5, 0.3]).unwrap();
        let close = |x: f64, y: f64| (x - y).abs() < 1e-12;
        assert!(close(a.before_probability(&b, -1), 1.0));
        assert!(close(a.before_probability(&b, 0), 0.2 + 0.6 + 0.2 * 0.8));
        assert!(close(a.before_probability(&b, 1), 0.2 + 0.6 * 0.8 + 0.2 * 0.3));
        assert!(close(a.before_probability(&b, 2), 0.2 * 0.8 + 0.6 * 0.3));
        assert!(close(a.before_probability(&b, 3), 0.2 * 0.3));
        assert!(close(a.before_probability(&b, 4), 0.0));
    }

    #[test]
    fn before_against_point_matches_cdf() {
        let a = Distribution::uniform(t(0), 10);
        let dep = Distribution::point(t(6));
        for buffer in 0..8 {
            assert_eq!(a.before_probability(&dep, buffer), a.cdf(t(6 - buffer)));
        }
    }

    #[test]
    fn error_display() {
        let err = InvalidDistribution::ExcessMass { total: 1.5 };
        assert_eq!(err.to_string(), "total probability mass 1.5 exceeds 1");
        let err = InvalidDistribution::NegativeMass {
            time: t(61),
            mass: -0.5,
        };
        assert_eq!(err.to_string(), "negative probability mass -0.5 at 01:01");
        let err = InvalidDistribution::SpanTooWide { from: 0, to: 20_000 };
        assert_eq!(err.to_string(), "histogram span 0..20000 is wider than one week");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        fn distribution()(
            start in -500i32..500,
            raw in prop::collection::vec(0.0f64..1.0, 0..20),
            scale in 0.0f64..=1.0,
        ) -> Distribution {
            let total: f64 = raw.iter().sum();
            let masses = if total > 0.0 {
                raw.iter().map(|m| m / total * scale).collect()
            } else {
                raw
            };
            Distribution::from_masses(Mtime::new(start), masses).unwrap()
        }
    }

    proptest! {
        /// Generated and mixed distributions never exceed unit mass
        #[test]
        fn mass_bounded(a in distribution(), b in distribution(), p in 0.0f64..=1.0) {
            prop_assert!(a.total_mass() <= 1.0 + MASS_TOLERANCE);
            let mixed = Distribution::mixture(&a, p, &b, 1.0 - p).unwrap();
            prop_assert!(mixed.total_mass() <= 1.0 + MASS_TOLERANCE);
            prop_assert!(mixed.validate().is_ok());
        }

        /// Shifting by zero is the identity
        #[test]
        fn shift_zero(d in distribution()) {
            prop_assert_eq!(d.shift(0), d);
        }

        /// Shifts compose additively
        #[test]
        fn shift_associative(d in distribution(), a in -1000i32..1000, b in -1000i32..1000) {
            prop_assert_eq!(d.shift(a).shift(b), d.shift(a + b));
        }

        /// Full weight on one side reproduces it exactly
        #[test]
        fn mixture_identity(d in distribution(), other in distribution()) {
            prop_assert_eq!(Distribution::mixture(&d, 1.0, &other, 0.0).unwrap(), d);
        }

        /// Shifting moves the mean by the same amount
        #[test]
        fn shift_moves_mean(d in distribution(), delta in -1000i32..1000) {
            match (d.mean(), d.shift(delta).mean()) {
                (Some(before), Some(after)) => {
                    prop_assert!((after - before - f64::from(delta)).abs() < 1e-6)
                }
                (None, None) => {}
                _ => prop_assert!(false, "mean presence changed by shift"),
            }
        }

        /// The CDF is non-decreasing and bounded by the total mass
        #[test]
        fn cdf_monotone(d in distribution(), a in -600i32..600, b in -600i32..600) {
            let (lo, hi) = (a.min(b), a.max(b));
            prop_assert!(d.cdf(Mtime::new(lo)) <= d.cdf(Mtime::new(hi)) + 1e-12);
            prop_assert!(d.cdf(Mtime::new(hi)) <= d.total_mass() + 1e-12);
        }

        /// Requiring a larger margin never makes catching more likely
        #[test]
        fn before_probability_non_increasing(
            a in distribution(),
            b in distribution(),
            offset in -50i32..50,
        ) {
            let tight = a.before_probability(&b, offset);
            let loose = a.before_probability(&b, offset + 1);
            prop_assert!(loose <= tight + 1e-12);
            prop_assert!((0.0..=1.0).contains(&tight));
        }
    }
}
