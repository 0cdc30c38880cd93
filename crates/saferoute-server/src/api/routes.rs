//! REST API routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use saferoute_core::alternatives::DEFAULT_ALTERNATIVES;
use saferoute_core::{Coordinate, Route, RouteAlternative, RouteError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::cache::CacheStats;
use crate::service::RouteRequest;
use crate::state::AppState;

pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/route/safe", post(safe_route))
        .route("/api/v1/route/alternatives", post(alternative_routes))
        .route("/api/v1/stats", get(stats))
}

fn default_safety_weight() -> f64 {
    0.5
}

#[derive(Debug, Clone, Deserialize)]
pub struct SafeRouteBody {
    pub start: Coordinate,
    pub end: Coordinate,
    #[serde(default = "default_safety_weight")]
    pub safety_weight: f64,
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlternativesBody {
    pub start: Coordinate,
    pub end: Coordinate,
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
struct SafeRouteResponse {
    #[serde(flatten)]
    route: Route,
    summary: String,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    uptime_secs: u64,
    profile: String,
    seed_mode: saferoute_core::SeedMode,
    provider_failures: u32,
    cache: CacheStats,
}

/// Input rejection surfaced to API callers.
#[derive(Debug)]
pub struct ApiError(pub RouteError);

impl From<RouteError> for ApiError {
    fn from(err: RouteError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!("Rejected route request: {}", self.0);
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn safe_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SafeRouteBody>,
) -> Result<Json<SafeRouteResponse>, ApiError> {
    let request = RouteRequest {
        start: body.start,
        end: body.end,
        safety_weight: body.safety_weight,
        force_refresh: body.force_refresh,
    };
    let route = state.service.compute(request).await?;
    Ok(Json(SafeRouteResponse {
        summary: route.summary(),
        route: (*route).clone(),
    }))
}

async fn alternative_routes(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AlternativesBody>,
) -> Result<Json<Vec<RouteAlternative>>, ApiError> {
    let count = body.count.unwrap_or(DEFAULT_ALTERNATIVES);
    let alternatives = state
        .service
        .compute_alternatives(body.start, body.end, count)
        .await?;
    Ok(Json(alternatives))
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        uptime_secs: state.uptime_secs(),
        profile: state.profile.name.clone(),
        seed_mode: state.service.seed_mode(),
        provider_failures: state.service.provider_failures(),
        cache: state.service.cache().stats(),
    })
}
