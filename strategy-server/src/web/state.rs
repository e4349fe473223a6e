//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::QueryCache;
use crate::engine::EngineConfig;
use crate::graph::Timetable;

/// Shared application state.
///
/// The timetable is loaded once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Loaded timetable
    pub timetable: Arc<Timetable>,

    /// Engine tunables
    pub config: Arc<EngineConfig>,

    /// Cached query responses
    pub cache: Arc<QueryCache>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(timetable: Timetable, config: EngineConfig, cache: QueryCache) -> Self {
        Self {
            timetable: Arc::new(timetable),
            config: Arc::new(config),
            cache: Arc::new(cache),
        }
    }
}
