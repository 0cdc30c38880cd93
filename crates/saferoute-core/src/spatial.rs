//! Distance and interpolation math.

use crate::models::Coordinate;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometers (Haversine formula).
pub fn haversine_distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lng - a.lng).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);

    // Rounding can push h a hair past 1.0 for antipodal points.
    let h = h.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Sum of the four coordinate components.
///
/// Feeds the trigonometric seed mode; periodic and weak, but stateless.
pub fn coordinate_sum_seed(a: Coordinate, b: Coordinate) -> f64 {
    a.lat + a.lng + b.lat + b.lng
}

/// Linear interpolation between `a` and `b` at fraction `t`.
pub fn interpolate(a: Coordinate, b: Coordinate, t: f64) -> Coordinate {
    Coordinate {
        lat: a.lat + (b.lat - a.lat) * t,
        lng: a.lng + (b.lng - a.lng) * t,
    }
}

/// Evenly spaced interior points between `a` and `b`, endpoints excluded.
pub fn interior_points(a: Coordinate, b: Coordinate, steps: usize) -> Vec<Coordinate> {
    let denom = (steps + 1) as f64;
    (1..=steps)
        .map(|i| interpolate(a, b, i as f64 / denom))
        .collect()
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
