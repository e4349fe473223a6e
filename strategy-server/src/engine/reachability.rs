//! Probability of catching an onward departure.

use crate::domain::Distribution;
use crate::graph::{Delay, StopInfo};

/// Probability that a traveler arriving per `arrival` is on the platform
/// `buffer` minutes before `departure` actually leaves.
///
/// Arrival and departure delays are independent. A cancelled departure can
/// never be caught. The result is always within `[0, 1]`.
///
/// ```
/// use strategy_server::domain::{Distribution, Mtime};
/// use strategy_server::engine::reachable_probability;
/// use strategy_server::graph::StopInfo;
///
/// let arrival = Distribution::uniform(Mtime::new(8), 4); // 08..=11
/// let departure = StopInfo::on_time(Mtime::new(12));
/// assert_eq!(reachable_probability(&arrival, 2, &departure), 0.75);
/// ```
pub fn reachable_probability(arrival: &Distribution, buffer: i32, departure: &StopInfo) -> f64 {
    if departure.cancelled {
        return 0.0;
    }
    let p = match &departure.delay {
        Delay::Fixed(minutes) => arrival.cdf(departure.scheduled + *minutes - buffer),
        Delay::Distributed(_) => arrival.before_probability(&departure.distribution(), buffer),
    };
    p.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Mtime;

    fn t(m: i32) -> Mtime {
        Mtime::new(m)
    }

    #[test]
    fn cancelled_departure_is_unreachable() {
        let arrival = Distribution::point(t(0));
        let departure = StopInfo::on_time(t(100)).cancelled();
        assert_eq!(reachable_probability(&arrival, 0, &departure), 0.0);
    }

    #[test]
    fn point_arrival_fixed_departure() {
        let arrival = Distribution::point(t(10));
        let departure = StopInfo::on_time(t(12));
        assert_eq!(reachable_probability(&arrival, 2, &departure), 1.0);
        assert_eq!(reachable_probability(&arrival, 3, &departure), 0.0);
    }

    #[test]
    fn fixed_delay_moves_the_deadline() {
        let arrival = Distribution::uniform(t(10), 4);
        let departure = StopInfo::delayed(t(10), 2);
        // Deadline 12 - 1 = 11: buckets 10 and 11.
        assert_eq!(reachable_probability(&arrival, 1, &departure), 0.5);
    }

    #[test]
    fn distributed_departure() {
        let arrival = Distribution::point(t(10));
        let departure = StopInfo::uncertain(t(9), Distribution::uniform(t(0), 4)).unwrap();
        // Departure uniform over 9..=12, need departure >= 11.
        assert_eq!(reachable_probability(&arrival, 1, &departure), 0.5);
    }

    #[test]
    fn partial_arrival_mass() {
        let arrival = Distribution::from_masses(t(0), vec![0.3, 0.2]).unwrap();
        let departure = StopInfo::on_time(t(50));
        let p = reachable_probability(&arrival, 0, &departure);
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_arrival() {
        let departure = StopInfo::on_time(t(50));
        assert_eq!(
            reachable_probability(&Distribution::empty(t(0)), 0, &departure),
            0.0
        );
    }
}
