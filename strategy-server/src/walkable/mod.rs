//! Walkable connections between stations.
//!
//! Some stations are close enough to walk between, which opens transfers
//! that don't appear in the timetable (e.g. two termini a few streets
//! apart). The walking time is the transfer buffer for such a change.

use std::collections::HashMap;

use crate::graph::StationId;

/// A collection of walkable connections between stations.
///
/// Connections are symmetric: if you can walk from A to B, you can walk from
/// B to A in the same time.
#[derive(Debug, Clone, Default)]
pub struct WalkableConnections {
    /// Neighbours of each station with the walk duration in minutes.
    /// Stored in both directions and kept sorted by station for stable
    /// iteration.
    neighbours: HashMap<StationId, Vec<(StationId, i32)>>,
}

impl WalkableConnections {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a walkable connection between two stations.
    ///
    /// The connection is stored symmetrically (both A→B and B→A). Adding a
    /// pair again replaces its duration.
    pub fn add(&mut self, a: StationId, b: StationId, minutes: i32) {
        self.insert_directed(a, b, minutes);
        self.insert_directed(b, a, minutes);
    }

    fn insert_directed(&mut self, from: StationId, to: StationId, minutes: i32) {
        let list = self.neighbours.entry(from).or_default();
        match list.binary_search_by_key(&to, |(s, _)| *s) {
            Ok(pos) => list[pos].1 = minutes,
            Err(pos) => list.insert(pos, (to, minutes)),
        }
    }

    /// Get the walk duration between two stations, if walkable.
    pub fn get(&self, from: StationId, to: StationId) -> Option<i32> {
        self.walkable_from(from)
            .iter()
            .find(|(s, _)| *s == to)
            .map(|(_, minutes)| *minutes)
    }

    /// Check if two stations are walkable.
    pub fn is_walkable(&self, from: StationId, to: StationId) -> bool {
        self.get(from, to).is_some()
    }

    /// All stations walkable from `from`, ordered by station id.
    pub fn walkable_from(&self, from: StationId) -> &[(StationId, i32)] {
        self.neighbours
            .get(&from)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the number of walkable pairs (counting A→B and B→A as one).
    pub fn len(&self) -> usize {
        self.neighbours.values().map(Vec::len).sum::<usize>() / 2
    }

    /// Returns true if there are no walkable connections.
    pub fn is_empty(&self) -> bool {
        self.neighbours.is_empty()
    }
}
