//! SafeRoute core - deterministic route synthesis with threat annotation.
//!
//! Everything in this crate is synchronous and free of stored random state:
//! identical inputs always produce identical paths, scores and segments.

pub mod alternatives;
pub mod crossing;
pub mod error;
pub mod models;
pub mod path;
pub mod region;
pub mod scoring;
pub mod seed;
pub mod spatial;
pub mod threat;

pub use alternatives::{alternative_weights, rank_alternatives, RouteAlternative, RouteKind};
pub use crossing::{nearest_crossing, select_crossing};
pub use error::RouteError;
pub use models::{
    BoundingBox, Coordinate, CrossingDefinition, PathBranch, Route, RouteSource, ThreatSegment,
};
pub use path::{synthesize_path, GeoPathSynthesizer, PathSynthesizer, SynthesizedPath};
pub use region::GeoProfile;
pub use scoring::{assemble_route, estimated_minutes, safety_score, validate_request};
pub use seed::{RouteSeed, SeedMode};
pub use spatial::{coordinate_sum_seed, haversine_distance_km};
pub use threat::{annotate, threat_probability, ThreatLevel};
