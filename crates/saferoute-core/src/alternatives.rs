//! Alternative routes at different safety/directness trade-offs.

use crate::models::Route;
use crate::spatial::round_to;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const MIN_ALTERNATIVE_WEIGHT: f64 = 0.1;
pub const MAX_ALTERNATIVE_WEIGHT: f64 = 0.9;
pub const DEFAULT_ALTERNATIVES: usize = 3;
pub const MAX_ALTERNATIVES: usize = 9;
const WEIGHT_DECIMALS: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    Fastest,
    Balanced,
    Safest,
}

impl RouteKind {
    pub fn from_weight(safety_weight: f64) -> Self {
        if safety_weight < 0.3 {
            Self::Fastest
        } else if safety_weight > 0.7 {
            Self::Safest
        } else {
            Self::Balanced
        }
    }

    pub fn optimization_focus(self) -> &'static str {
        match self {
            Self::Fastest => "Optimized for speed and efficiency",
            Self::Balanced => "Balanced optimization for safety and efficiency",
            Self::Safest => "Optimized for maximum safety",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteAlternative {
    pub kind: RouteKind,
    pub optimization_focus: String,
    pub safety_weight: f64,
    pub route: Route,
}

impl RouteAlternative {
    pub fn new(safety_weight: f64, route: Route) -> Self {
        let kind = RouteKind::from_weight(safety_weight);
        Self {
            kind,
            optimization_focus: kind.optimization_focus().to_string(),
            safety_weight,
            route,
        }
    }

    /// Ranking score; higher is better.
    pub fn rank_score(&self) -> f64 {
        self.route.safety_score * 0.6 + (1.0 / (self.route.distance_km + 1.0)) * 0.4
    }
}

/// Evenly spaced weights in [0.1, 0.9]; a single alternative uses 0.1.
///
/// Weights are rounded to one decimal, the granularity routes are cached at,
/// so each alternative is labelled with the weight its route was built for.
pub fn alternative_weights(count: usize) -> Vec<f64> {
    let count = count.clamp(1, MAX_ALTERNATIVES);
    if count == 1 {
        return vec![MIN_ALTERNATIVE_WEIGHT];
    }
    let step = (MAX_ALTERNATIVE_WEIGHT - MIN_ALTERNATIVE_WEIGHT) / (count - 1) as f64;
    (0..count)
        .map(|i| round_to(MIN_ALTERNATIVE_WEIGHT + step * i as f64, WEIGHT_DECIMALS))
        .collect()
}

/// Sort best first. The sort is stable, so equal scores keep weight order.
pub fn rank_alternatives(alternatives: &mut [RouteAlternative]) {
    alternatives.sort_by(|a, b| {
        b.rank_score()
            .partial_cmp(&a.rank_score())
            .unwrap_or(Ordering::Equal)
    });
}
