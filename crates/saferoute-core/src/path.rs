//! Path synthesis without a street network.
//!
//! Exactly one of three branches is taken for a request:
//! - crossing: start, crossing approach, crossing exit, snapped points, end
//! - grid: start, snapped points, end
//! - generic: start, wobbled points, end

use crate::crossing::select_crossing;
use crate::models::{Coordinate, PathBranch};
use crate::region::GeoProfile;
use crate::seed::RouteSeed;
use crate::spatial::interior_points;
use std::sync::Arc;

/// Interior points emitted by the crossing and grid branches.
pub const GRID_STEPS: usize = 8;
/// Interior points emitted by the generic branch.
pub const GENERIC_STEPS: usize = 12;
/// Snapping precision, roughly 111 m of latitude.
pub const GRID_PRECISION_DECIMALS: i32 = 3;
/// Peak lateral offset in degrees for the generic branch.
pub const LATERAL_AMPLITUDE_DEG: f64 = 0.0005;

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedPath {
    pub branch: PathBranch,
    pub points: Vec<Coordinate>,
}

/// Source of fallback path geometry.
pub trait PathSynthesizer: Send + Sync {
    fn synthesize(&self, start: Coordinate, end: Coordinate, seed: &RouteSeed) -> SynthesizedPath;
}

/// Synthesizer backed by a geography profile.
#[derive(Debug, Clone)]
pub struct GeoPathSynthesizer {
    profile: Arc<GeoProfile>,
}

impl GeoPathSynthesizer {
    pub fn new(profile: Arc<GeoProfile>) -> Self {
        Self { profile }
    }
}

impl PathSynthesizer for GeoPathSynthesizer {
    fn synthesize(&self, start: Coordinate, end: Coordinate, seed: &RouteSeed) -> SynthesizedPath {
        synthesize_path(&self.profile, start, end, seed)
    }
}

pub fn synthesize_path(
    profile: &GeoProfile,
    start: Coordinate,
    end: Coordinate,
    seed: &RouteSeed,
) -> SynthesizedPath {
    if let Some(crossing) = select_crossing(profile, start, end) {
        let mut points = Vec::with_capacity(GRID_STEPS + 4);
        points.push(start);
        points.push(crossing.approach);
        points.push(crossing.exit);
        points.extend(snapped_points(crossing.exit, end, GRID_STEPS));
        points.push(end);
        return SynthesizedPath {
            branch: PathBranch::Crossing,
            points,
        };
    }

    if profile.in_metro_region(start) && profile.in_metro_region(end) {
        let mut points = Vec::with_capacity(GRID_STEPS + 2);
        points.push(start);
        points.extend(snapped_points(start, end, GRID_STEPS));
        points.push(end);
        return SynthesizedPath {
            branch: PathBranch::Grid,
            points,
        };
    }

    let mut points = Vec::with_capacity(GENERIC_STEPS + 2);
    points.push(start);
    points.extend(wobbled_points(start, end, GENERIC_STEPS, seed));
    points.push(end);
    SynthesizedPath {
        branch: PathBranch::Generic,
        points,
    }
}

fn snapped_points(from: Coordinate, to: Coordinate, steps: usize) -> Vec<Coordinate> {
    interior_points(from, to, steps)
        .into_iter()
        .map(|point| point.rounded(GRID_PRECISION_DECIMALS))
        .collect()
}

/// Longitude is nudged for the first half of the steps, latitude for the rest.
fn wobbled_points(
    from: Coordinate,
    to: Coordinate,
    steps: usize,
    seed: &RouteSeed,
) -> Vec<Coordinate> {
    let half = steps / 2;
    interior_points(from, to, steps)
        .into_iter()
        .enumerate()
        .map(|(idx, point)| {
            let offset = seed.lateral_jitter(point) * LATERAL_AMPLITUDE_DEG;
            if idx < half {
                Coordinate::new(point.lat, (point.lng + offset).clamp(-180.0, 180.0))
            } else {
                Coordinate::new((point.lat + offset).clamp(-90.0, 90.0), point.lng)
            }
        })
        .collect()
}
