//! Geography profiles: metro region, core sub-region and barrier crossings.
//!
//! A profile is plain data so new areas can be loaded from JSON instead of
//! being compiled in. The built-in profile covers New York City, with
//! Manhattan as the core sub-region separated from the rest of the metro
//! area by water.

use crate::error::RouteError;
use crate::models::{BoundingBox, Coordinate, CrossingDefinition};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoProfile {
    pub name: String,
    /// Outer metro box.
    pub metro: BoundingBox,
    /// Core sub-region as a union of boxes.
    pub core: Vec<BoundingBox>,
    /// Crossings in tie-break order, declared core side first.
    pub crossings: Vec<CrossingDefinition>,
}

impl GeoProfile {
    pub fn new_york() -> Self {
        let c = Coordinate::new;
        Self {
            name: "new-york".to_string(),
            metro: BoundingBox::new(c(40.4774, -74.2591), c(40.9176, -73.7004)),
            core: vec![
                // Lower Manhattan up to 34th St.
                BoundingBox::new(c(40.7000, -74.0200), c(40.7450, -73.9710)),
                // Midtown and the Upper East/West Side.
                BoundingBox::new(c(40.7450, -74.0120), c(40.8000, -73.9450)),
                // Harlem to Inwood.
                BoundingBox::new(c(40.8000, -73.9650), c(40.8820, -73.9070)),
            ],
            crossings: vec![
                CrossingDefinition::new(
                    "Brooklyn Bridge",
                    c(40.7081, -73.9987),
                    c(40.6995, -73.9900),
                ),
                CrossingDefinition::new(
                    "Manhattan Bridge",
                    c(40.7133, -73.9942),
                    c(40.6990, -73.9870),
                ),
                CrossingDefinition::new(
                    "Williamsburg Bridge",
                    c(40.7180, -73.9820),
                    c(40.7112, -73.9620),
                ),
                CrossingDefinition::new(
                    "Queensboro Bridge",
                    c(40.7590, -73.9630),
                    c(40.7527, -73.9400),
                ),
                CrossingDefinition::new(
                    "Brooklyn-Battery Tunnel",
                    c(40.7010, -74.0130),
                    c(40.6930, -73.9990),
                ),
            ],
        }
    }

    /// Parse and validate a profile from JSON.
    pub fn from_json(raw: &str) -> Result<Self, RouteError> {
        let profile: Self = serde_json::from_str(raw)
            .map_err(|err| RouteError::InvalidProfile(err.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), RouteError> {
        if !self.metro.is_well_formed() {
            return Err(RouteError::InvalidProfile(format!(
                "metro box of '{}' is malformed",
                self.name
            )));
        }
        if let Some(idx) = self.core.iter().position(|bbox| !bbox.is_well_formed()) {
            return Err(RouteError::InvalidProfile(format!(
                "core box {} of '{}' is malformed",
                idx, self.name
            )));
        }
        if !self.core.is_empty() && self.crossings.is_empty() {
            return Err(RouteError::InvalidProfile(format!(
                "'{}' splits the metro region but declares no crossings",
                self.name
            )));
        }
        for crossing in &self.crossings {
            if !crossing.approach.is_valid() || !crossing.exit.is_valid() {
                return Err(RouteError::InvalidProfile(format!(
                    "crossing '{}' has an invalid waypoint",
                    crossing.name
                )));
            }
        }
        Ok(())
    }

    pub fn in_metro_region(&self, point: Coordinate) -> bool {
        self.metro.contains(point)
    }

    pub fn in_core_sub_region(&self, point: Coordinate) -> bool {
        self.core.iter().any(|bbox| bbox.contains(point))
    }

    /// Both points in the metro region, on opposite sides of the barrier.
    pub fn needs_crossing(&self, start: Coordinate, end: Coordinate) -> bool {
        self.in_metro_region(start)
            && self.in_metro_region(end)
            && self.in_core_sub_region(start) != self.in_core_sub_region(end)
    }
}

impl Default for GeoProfile {
    fn default() -> Self {
        Self::new_york()
    }
}
