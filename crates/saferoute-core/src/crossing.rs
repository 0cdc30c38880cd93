//! Barrier-crossing selection.

use crate::models::{Coordinate, CrossingDefinition};
use crate::region::GeoProfile;
use crate::spatial::haversine_distance_km;

/// Crossing minimizing `d(start, approach) + d(exit, end)`.
///
/// Ties go to the earliest definition in declared order.
pub fn nearest_crossing<'a>(
    start: Coordinate,
    end: Coordinate,
    crossings: &'a [CrossingDefinition],
) -> Option<&'a CrossingDefinition> {
    let mut best: Option<(&CrossingDefinition, f64)> = None;
    for crossing in crossings {
        let cost = haversine_distance_km(start, crossing.approach)
            + haversine_distance_km(end, crossing.exit);
        match best {
            Some((_, best_cost)) if cost >= best_cost => {}
            _ => best = Some((crossing, cost)),
        }
    }
    best.map(|(crossing, _)| crossing)
}

/// Pick the crossing for a trip that changes sub-region inside the metro area.
///
/// Returns `None` when no crossing is needed. Definitions are declared core
/// side first; for trips starting outside the core they are walked reversed so
/// `approach` is always on the start side.
pub fn select_crossing(
    profile: &GeoProfile,
    start: Coordinate,
    end: Coordinate,
) -> Option<CrossingDefinition> {
    if !profile.needs_crossing(start, end) {
        return None;
    }

    if profile.in_core_sub_region(start) {
        nearest_crossing(start, end, &profile.crossings).cloned()
    } else {
        let reversed: Vec<CrossingDefinition> = profile
            .crossings
            .iter()
            .map(CrossingDefinition::reversed)
            .collect();
        nearest_crossing(start, end, &reversed).cloned()
    }
}
