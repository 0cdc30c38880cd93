//! HTTP API for the SafeRoute server.

mod routes;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use routes::{AlternativesBody, ApiError, SafeRouteBody};

/// Full router with state, tracing and CORS layers applied.
pub fn router(state: Arc<AppState>) -> Router {
    routes::create_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
