//! External routing-provider client.
//!
//! The provider supplies real street geometry when reachable. Any failure is
//! reported as a [`ProviderError`] and the caller falls back to synthesis.

use futures::future::BoxFuture;
use reqwest::Client;
use saferoute_core::Coordinate;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("routing provider disabled")]
    Disabled,
    #[error("routing provider backing off")]
    BackingOff,
    #[error("routing provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("routing provider returned HTTP {0}")]
    Status(u16),
    #[error("routing provider timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("routing provider found no route")]
    NoRoute,
}

/// Source of real route geometry.
pub trait RoutingProvider: Send + Sync {
    /// Ordered path from `start` to `end`.
    fn fetch_path(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> BoxFuture<'_, Result<Vec<Coordinate>, ProviderError>>;
}

/// Provider used when no URL is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledProvider;

impl RoutingProvider for DisabledProvider {
    fn fetch_path(
        &self,
        _start: Coordinate,
        _end: Coordinate,
    ) -> BoxFuture<'_, Result<Vec<Coordinate>, ProviderError>> {
        Box::pin(async { Err(ProviderError::Disabled) })
    }
}

/// OSRM-compatible HTTP provider.
pub struct OsrmProvider {
    client: Client,
    base_url: String,
    profile: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// `[lng, lat]` pairs.
    coordinates: Vec<Vec<f64>>,
}

impl OsrmProvider {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        profile: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            profile: profile.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Client::new(),
            config.provider_url.clone(),
            config.provider_profile.clone(),
            config.provider_timeout,
        )
    }

    fn route_url(&self, start: Coordinate, end: Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=geojson",
            self.base_url, self.profile, start.lng, start.lat, end.lng, end.lat
        )
    }

    async fn request(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        let response = self
            .client
            .get(self.route_url(start, end))
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_osrm_body(&body)
    }
}

impl RoutingProvider for OsrmProvider {
    fn fetch_path(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> BoxFuture<'_, Result<Vec<Coordinate>, ProviderError>> {
        Box::pin(self.request(start, end))
    }
}

fn parse_osrm_body(body: &str) -> Result<Vec<Coordinate>, ProviderError> {
    let payload: OsrmResponse = serde_json::from_str(body)
        .map_err(|err| ProviderError::Malformed(err.to_string()))?;
    let route = payload
        .routes
        .into_iter()
        .next()
        .ok_or(ProviderError::NoRoute)?;

    route
        .geometry
        .coordinates
        .iter()
        .map(|pair| match pair.as_slice() {
            [lng, lat, ..] => Ok(Coordinate::new(*lat, *lng)),
            _ => Err(ProviderError::Malformed(format!(
                "coordinate with {} components",
                pair.len()
            ))),
        })
        .collect()
}

/// Check a provider path and pin its ends to the requested points.
pub fn anchor_provider_path(
    mut path: Vec<Coordinate>,
    start: Coordinate,
    end: Coordinate,
) -> Result<Vec<Coordinate>, ProviderError> {
    if path.len() < 2 {
        return Err(ProviderError::Malformed(format!(
            "path has {} points",
            path.len()
        )));
    }
    if let Some(bad) = path.iter().find(|point| !point.is_valid()) {
        return Err(ProviderError::Malformed(format!(
            "invalid point ({}, {})",
            bad.lat, bad.lng
        )));
    }
    let last = path.len() - 1;
    path[0] = start;
    path[last] = end;
    Ok(path)
}
