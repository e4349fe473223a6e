//! Feed loading errors.

use std::path::PathBuf;

use crate::domain::InvalidDistribution;
use crate::graph::GraphError;

/// Errors from reading a timetable or delay model document.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON for its schema
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document describes an inconsistent network
    #[error("invalid timetable: {0}")]
    Graph(#[from] GraphError),

    /// A delay distribution in the document is malformed
    #[error("invalid distribution for {context}: {source}")]
    Distribution {
        context: String,
        #[source]
        source: InvalidDistribution,
    },

    /// A connection or footpath names a station the document doesn't define
    #[error("unknown station code {0}")]
    UnknownStation(String),

    /// A stop gives no usable scheduled time
    #[error("no scheduled time for {0}")]
    MissingTime(String),

    /// The epoch timestamp is out of range
    #[error("invalid epoch {0}")]
    InvalidEpoch(i64),

    /// A delay model entry has neither a distribution nor buckets
    #[error("no delay data for {0}")]
    MissingDelay(String),

    /// A delay model entry is conditioned on an empty range
    #[error("empty {field} range {from}..{to} for {context}")]
    EmptyRange {
        context: String,
        field: &'static str,
        from: i32,
        to: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FeedError::UnknownStation("XYZ".into());
        assert_eq!(err.to_string(), "unknown station code XYZ");

        let err = FeedError::Distribution {
            context: "route S1 trip 0 connection 2 arrival".into(),
            source: InvalidDistribution::ExcessMass { total: 1.5 },
        };
        assert_eq!(
            err.to_string(),
            "invalid distribution for route S1 trip 0 connection 2 arrival: total probability mass 1.5 exceeds 1"
        );

        let err = FeedError::Io {
            path: PathBuf::from("/tmp/missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().starts_with("failed to read /tmp/missing.json"));

        let err = FeedError::EmptyRange {
            context: "product type 1 Arrival".into(),
            field: "prior_delay",
            from: 5,
            to: 5,
        };
        assert_eq!(err.to_string(), "empty prior_delay range 5..5 for product type 1 Arrival");

        let err = FeedError::from(GraphError::DuplicateStation("A".into()));
        assert_eq!(err.to_string(), "invalid timetable: duplicate station code A");
    }
}
