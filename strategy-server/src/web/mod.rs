//! Web layer for the strategy engine.
//!
//! Provides HTTP endpoints for listing stations and running queries.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
