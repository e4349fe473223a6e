//! Timetable and delay model ingestion from JSON documents.
//!
//! This is the only way data enters the engine: documents are parsed with
//! serde, converted into a [`Timetable`] through its builder and then never
//! modified again.

mod convert;
mod error;
mod types;

use std::path::Path;

use crate::delays::DelayModel;
use crate::graph::Timetable;

pub use convert::{build_delay_model, build_timetable};
pub use error::FeedError;
pub use types::{
    BucketDoc, ConnectionDoc, DelayEntryDoc, DelayModelDoc, DistributionDoc, FallbackDoc,
    FootpathDoc, RangeDoc, RouteDoc, StationDoc, StopDoc, TimetableDoc, TripDoc,
};

/// Parse a timetable document, filling missing stop delays from `delays`.
pub fn parse_timetable(json: &str, delays: &DelayModel) -> Result<Timetable, FeedError> {
    let doc: TimetableDoc = serde_json::from_str(json)?;
    build_timetable(&doc, delays)
}

/// Read and parse a timetable document from disk.
pub fn load_timetable(path: impl AsRef<Path>, delays: &DelayModel) -> Result<Timetable, FeedError> {
    parse_timetable(&read(path.as_ref())?, delays)
}

/// Parse a delay model document.
pub fn parse_delay_model(json: &str) -> Result<DelayModel, FeedError> {
    let doc: DelayModelDoc = serde_json::from_str(json)?;
    build_delay_model(&doc)
}

/// Read and parse a delay model document from disk.
pub fn load_delay_model(path: impl AsRef<Path>) -> Result<DelayModel, FeedError> {
    parse_delay_model(&read(path.as_ref())?)
}

fn read(path: &Path) -> Result<String, FeedError> {
    std::fs::read_to_string(path).map_err(|source| FeedError::Io {
        path: path.to_path_buf(),
        source,
    })
}
