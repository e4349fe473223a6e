use std::net::SocketAddr;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use strategy_server::cache::{CacheConfig, QueryCache};
use strategy_server::delays::DelayModel;
use strategy_server::engine::EngineConfig;
use strategy_server::feed::{load_delay_model, load_timetable};
use strategy_server::web::{AppState, create_router};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Ok(timetable_path) = std::env::var("TIMETABLE_PATH") else {
        error!("TIMETABLE_PATH not set");
        return ExitCode::FAILURE;
    };

    let delays = match std::env::var("DELAY_MODEL_PATH") {
        Ok(path) => match load_delay_model(&path) {
            Ok(model) => {
                info!(path = %path, entries = model.len(), "loaded delay model");
                model
            }
            Err(e) => {
                error!(path = %path, "failed to load delay model: {e}");
                return ExitCode::FAILURE;
            }
        },
        Err(_) => DelayModel::new(),
    };

    let timetable = match load_timetable(&timetable_path, &delays) {
        Ok(timetable) => timetable,
        Err(e) => {
            error!(path = %timetable_path, "failed to load timetable: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!(
        stations = timetable.station_count(),
        connections = timetable.connection_count(),
        "loaded timetable"
    );

    let config = EngineConfig::from_env();
    let cache = QueryCache::new(&CacheConfig::default());
    let app = create_router(AppState::new(timetable, config, cache));

    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned());
    let addr: SocketAddr = match bind.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(bind = %bind, "invalid BIND_ADDR: {e}");
            return ExitCode::FAILURE;
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, "failed to bind: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("Journey strategy server listening on http://{addr}");
    info!("  GET  /health    - Health check");
    info!("  GET  /stations  - List stations");
    info!("  POST /query     - Arrival distribution for a journey");

    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
