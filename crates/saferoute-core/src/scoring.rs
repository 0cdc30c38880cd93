//! Request validation, route-level scores and route assembly.

use crate::error::RouteError;
use crate::models::{Coordinate, PathBranch, Route, RouteSource};
use crate::seed::RouteSeed;
use crate::spatial::{haversine_distance_km, round_to};
use crate::threat::annotate;
use chrono::Utc;

/// Assumed walking speed.
pub const WALKING_SPEED_KMH: f64 = 5.0;
const BASE_SAFETY: f64 = 0.85;
const SAFETY_SPREAD: f64 = 0.15;

pub fn validate_request(
    start: Coordinate,
    end: Coordinate,
    safety_weight: f64,
) -> Result<(), RouteError> {
    for point in [start, end] {
        if !point.is_valid() {
            return Err(RouteError::InvalidCoordinate {
                lat: point.lat,
                lng: point.lng,
            });
        }
    }
    if start == end {
        return Err(RouteError::DegenerateRoute);
    }
    if !safety_weight.is_finite() || !(0.0..=1.0).contains(&safety_weight) {
        return Err(RouteError::InvalidSafetyWeight(safety_weight));
    }
    Ok(())
}

/// Placeholder scoring: a base of 0.85 wobbled by +/-0.15, clamped to [0.1, 1.0].
pub fn safety_score(seed: &RouteSeed) -> f64 {
    let score = BASE_SAFETY + seed.score_wobble() * SAFETY_SPREAD;
    if score.is_finite() {
        score.clamp(0.1, 1.0)
    } else {
        BASE_SAFETY
    }
}

/// Walking minutes for a distance, rounded to the nearest minute.
pub fn estimated_minutes(distance_km: f64) -> u32 {
    if !distance_km.is_finite() || distance_km <= 0.0 {
        return 0;
    }
    (distance_km / WALKING_SPEED_KMH * 60.0).round() as u32
}

/// Build a route for a path that already starts at `start` and ends at `end`.
pub fn assemble_route(
    start: Coordinate,
    end: Coordinate,
    safety_weight: f64,
    seed: &RouteSeed,
    path: Vec<Coordinate>,
    source: RouteSource,
    branch: Option<PathBranch>,
) -> Route {
    let distance_km = round_to(haversine_distance_km(start, end), 2);
    let threat_segments = annotate(path.len(), safety_weight, seed);

    Route {
        path,
        safety_score: safety_score(seed),
        distance_km,
        estimated_time_minutes: estimated_minutes(distance_km),
        threat_segments,
        source,
        branch,
        last_updated: Utc::now(),
    }
}
