//! Error types for route synthesis.

use thiserror::Error;

/// Errors raised before any route computation takes place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// Latitude outside [-90, 90] or longitude outside [-180, 180], or not finite.
    #[error("invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// Start and end are the same point.
    #[error("start and end coordinates are identical")]
    DegenerateRoute,

    #[error("safety weight {0} is outside [0, 1]")]
    InvalidSafetyWeight(f64),

    /// A geography profile failed validation or could not be parsed.
    #[error("invalid geography profile: {0}")]
    InvalidProfile(String),
}
