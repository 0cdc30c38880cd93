//! Shared application state.

use saferoute_core::GeoProfile;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::service::RouteSynthesisService;

/// Application state handed to every request handler.
pub struct AppState {
    pub service: RouteSynthesisService,
    pub profile: Arc<GeoProfile>,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: &Config, profile: Arc<GeoProfile>) -> Self {
        Self::with_service(
            RouteSynthesisService::from_config(config, profile.clone()),
            profile,
        )
    }

    pub fn with_service(service: RouteSynthesisService, profile: Arc<GeoProfile>) -> Self {
        Self {
            service,
            profile,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
