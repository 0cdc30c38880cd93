//! Core data models for route synthesis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Round both components to `decimals` places.
    pub fn rounded(&self, decimals: i32) -> Self {
        Self {
            lat: crate::spatial::round_to(self.lat, decimals),
            lng: crate::spatial::round_to(self.lng, decimals),
        }
    }
}

/// Axis-aligned box. No anti-meridian handling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north_east: Coordinate,
    pub south_west: Coordinate,
}

impl BoundingBox {
    pub const fn new(south_west: Coordinate, north_east: Coordinate) -> Self {
        Self {
            north_east,
            south_west,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.north_east.is_valid()
            && self.south_west.is_valid()
            && self.north_east.lat >= self.south_west.lat
            && self.north_east.lng >= self.south_west.lng
    }

    /// Inclusive membership test.
    pub fn contains(&self, point: Coordinate) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }
}

/// A fixed barrier crossing (bridge or tunnel) between two sub-regions.
///
/// `approach` lies on the core side and `exit` on the outer side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingDefinition {
    pub name: String,
    pub approach: Coordinate,
    pub exit: Coordinate,
}

impl CrossingDefinition {
    pub fn new(name: impl Into<String>, approach: Coordinate, exit: Coordinate) -> Self {
        Self {
            name: name.into(),
            approach,
            exit,
        }
    }

    /// The same crossing walked in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            name: self.name.clone(),
            approach: self.exit,
            exit: self.approach,
        }
    }
}

/// A flagged stretch of the path, addressed by indices into `Route::path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatSegment {
    pub start_idx: usize,
    pub end_idx: usize,
    /// Urban Threat Index in [0.2, 0.7].
    pub uti_score: f64,
    pub reason: String,
    pub mitigation: String,
}

/// Where the path geometry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    Provider,
    Synthesized,
}

/// Which synthesis branch produced a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathBranch {
    /// Metro region, different sub-regions: a crossing is inserted.
    Crossing,
    /// Metro region, same sub-region: street-grid snapped interpolation.
    Grid,
    /// Anywhere else: interpolation with a lateral wobble.
    Generic,
}

/// A computed route. Treated as an immutable snapshot once cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub path: Vec<Coordinate>,
    pub safety_score: f64,
    pub distance_km: f64,
    pub estimated_time_minutes: u32,
    pub threat_segments: Vec<ThreatSegment>,
    pub source: RouteSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<PathBranch>,
    pub last_updated: DateTime<Utc>,
}

impl Route {
    /// Check the structural invariants of a route.
    ///
    /// Used to reject corrupted cache entries.
    pub fn validate(&self) -> Result<(), String> {
        if self.path.len() < 2 {
            return Err(format!("path has {} points", self.path.len()));
        }
        if let Some(bad) = self.path.iter().find(|point| !point.is_valid()) {
            return Err(format!("path contains invalid point ({}, {})", bad.lat, bad.lng));
        }
        if !(0.1..=1.0).contains(&self.safety_score) {
            return Err(format!("safety score {} out of range", self.safety_score));
        }
        if !self.distance_km.is_finite() || self.distance_km < 0.0 {
            return Err(format!("distance {} is not a valid length", self.distance_km));
        }

        let mut previous_end: Option<usize> = None;
        for segment in &self.threat_segments {
            if segment.start_idx >= segment.end_idx || segment.end_idx >= self.path.len() {
                return Err(format!(
                    "segment {}..{} invalid for path of {} points",
                    segment.start_idx,
                    segment.end_idx,
                    self.path.len()
                ));
            }
            if previous_end.is_some_and(|end| segment.start_idx <= end) {
                return Err(format!("segment starting at {} overlaps", segment.start_idx));
            }
            if !(0.2..=0.7).contains(&segment.uti_score) {
                return Err(format!("uti score {} out of range", segment.uti_score));
            }
            previous_end = Some(segment.end_idx);
        }
        Ok(())
    }

    /// Short human-readable description for transient notifications.
    pub fn summary(&self) -> String {
        format!(
            "{:.2} km · {} min · {:.0}% safe",
            self.distance_km,
            self.estimated_time_minutes,
            self.safety_score * 100.0
        )
    }
}
