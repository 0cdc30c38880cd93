//! Hand-off of finished routes to the display layer.

use saferoute_core::Route;

/// Receives every freshly computed route with its one-line summary.
pub trait RouteNotifier: Send + Sync {
    fn route_ready(&self, route: &Route, summary: &str);
}

/// Writes route summaries to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl RouteNotifier for TracingNotifier {
    fn route_ready(&self, route: &Route, summary: &str) {
        tracing::info!(
            points = route.path.len(),
            threats = route.threat_segments.len(),
            source = ?route.source,
            "Route ready: {}",
            summary
        );
    }
}
