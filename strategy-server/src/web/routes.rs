//! HTTP route handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::{debug, error, warn};

use crate::domain::Mtime;
use crate::engine::{Engine, EngineError, QueryOutcome, QueryRequest};
use crate::graph::{StationId, Timetable};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stations", get(list_stations))
        .route("/query", post(run_query))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// List every station in the timetable.
async fn list_stations(State(state): State<AppState>) -> Json<StationsResponse> {
    let stations = state
        .timetable
        .stations()
        .iter()
        .map(StationResult::from_station)
        .collect();

    Json(StationsResponse { stations })
}

/// Compute the best-strategy arrival distribution for a query.
async fn run_query(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<QueryResponse>, AppError> {
    // Parse JSON manually so malformed bodies get the same error shape
    let req: QueryApiRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!(body = %String::from_utf8_lossy(&body), "rejected query body");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })?;

    let origin = lookup_station(&state.timetable, &req.origin)?;
    let destination = lookup_station(&state.timetable, &req.destination)?;
    let max_time = req.max_time.unwrap_or(state.config.horizon_mins);
    let request = QueryRequest::new(origin, destination, Mtime::new(req.start), max_time);

    let key = (origin, destination, request.start, max_time);
    if let Some(cached) = state.cache.get(&key).await {
        debug!(origin = %req.origin, destination = %req.destination, "cache hit");
        return Ok(Json(QueryResponse::clone(&cached)));
    }

    let timetable = state.timetable.clone();
    let config = state.config.clone();
    let response = tokio::task::spawn_blocking(move || {
        let outcome = Engine::new(&timetable, &config).query(&request)?;
        Ok::<_, EngineError>(query_response(&timetable, &request, &outcome))
    })
    .await
    .map_err(|e| AppError::Internal {
        message: format!("Query task failed: {e}"),
    })??;

    let response = Arc::new(response);
    state.cache.insert(key, response.clone()).await;
    Ok(Json(QueryResponse::clone(&response)))
}

fn lookup_station(timetable: &Timetable, code: &str) -> Result<StationId, AppError> {
    timetable.find_station(code).ok_or_else(|| AppError::BadRequest {
        message: format!("Unknown station: {code}"),
    })
}

fn query_response(
    timetable: &Timetable,
    request: &QueryRequest,
    outcome: &QueryOutcome,
) -> QueryResponse {
    QueryResponse {
        origin: timetable[request.origin].code.clone(),
        destination: timetable[request.destination].code.clone(),
        start: request.start.minutes(),
        max_time: request.max_time,
        distribution: DistributionView::from_distribution(&outcome.distribution),
        options: outcome
            .options
            .iter()
            .map(|option| OptionView::from_option(timetable, request.destination, option))
            .collect(),
        visited: outcome.visited,
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    GatewayTimeout { message: String },
    Internal { message: String },
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::UnknownStation(_) | EngineError::InvalidQuery(_) => AppError::BadRequest {
                message: e.to_string(),
            },
            EngineError::Timeout { .. } => AppError::GatewayTimeout {
                message: e.to_string(),
            },
            _ => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::GatewayTimeout { message } => (StatusCode::GATEWAY_TIMEOUT, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, "{message}");
        } else {
            warn!(%status, "{message}");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, QueryCache};
    use crate::engine::EngineConfig;
    use crate::graph::{ConnectionId, ConnectionSpec, StopInfo, TimetableBuilder};

    fn state() -> AppState {
        let mut b = TimetableBuilder::new();
        let a = b.add_station("A", "Alpha").unwrap();
        let c = b.add_station("B", "Beta").unwrap();
        b.set_location(a, 52.5, 13.4).unwrap();
        let route = b.add_route("re1", "RE 1", 3);
        let trip = b.new_trip();
        b.add_connection(ConnectionSpec::new(
            route,
            trip,
            a,
            c,
            StopInfo::on_time(Mtime::new(10)),
            StopInfo::on_time(Mtime::new(20)),
        ))
        .unwrap();

        let config = EngineConfig {
            workers: 1,
            ..EngineConfig::default()
        };
        AppState::new(b.build(), config, QueryCache::new(&CacheConfig::default()))
    }

    fn body(json: &str) -> Bytes {
        Bytes::from(json.to_owned())
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn stations_listed_in_order() {
        let Json(response) = list_stations(State(state())).await;
        let codes: Vec<_> = response.stations.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, ["A", "B"]);
        assert_eq!(response.stations[0].lat, 52.5);
    }

    #[tokio::test]
    async fn direct_query() {
        let state = state();
        let Json(response) = run_query(
            State(state.clone()),
            body(r#"{"origin": "A", "destination": "B", "start": 0, "max_time": 60}"#),
        )
        .await
        .unwrap();

        assert_eq!(response.distribution.start, 20);
        assert_eq!(response.distribution.masses, vec![1.0]);
        assert_eq!(response.distribution.median, Some(20));
        assert_eq!(response.options.len(), 1);
        assert_eq!(response.options[0].connection, Some(ConnectionId(0).index()));
        assert_eq!(response.options[0].route.as_deref(), Some("RE 1"));

        let key = (StationId(0), StationId(1), Mtime::new(0), 60);
        let cached = state.cache.get(&key).await.unwrap();
        assert_eq!(*cached, response);
    }

    #[tokio::test]
    async fn default_horizon_applies() {
        let Json(response) = run_query(
            State(state()),
            body(r#"{"origin": "A", "destination": "B", "start": 0}"#),
        )
        .await
        .unwrap();
        assert_eq!(response.max_time, EngineConfig::default().horizon_mins);
    }

    #[tokio::test]
    async fn unreachable_is_not_an_error() {
        let Json(response) = run_query(
            State(state()),
            body(r#"{"origin": "B", "destination": "A", "start": 0, "max_time": 60}"#),
        )
        .await
        .unwrap();
        assert_eq!(response.distribution.feasible_probability, 0.0);
        assert!(response.options.is_empty());
    }

    #[tokio::test]
    async fn bad_requests() {
        let cases = [
            "not json",
            r#"{"origin": "A", "destination": "Z", "start": 0}"#,
            r#"{"origin": "A", "destination": "B", "start": 0, "max_time": -5}"#,
        ];
        for case in cases {
            let err = run_query(State(state()), body(case)).await.unwrap_err();
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST, "{case}");
        }
    }

    #[test]
    fn engine_error_mapping() {
        let status = |e: EngineError| AppError::from(e).into_response().status();
        assert_eq!(status(EngineError::Timeout { visited: 9 }), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status(EngineError::UnknownStation(StationId(4))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(EngineError::CycleDetected {
                connection: ConnectionId(1)
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
