//! Server configuration from environment.

use anyhow::Context;
use saferoute_core::{GeoProfile, SeedMode};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PROVIDER_URL: &str = "https://router.project-osrm.org";
const MIN_PROVIDER_TIMEOUT_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Routing provider base URL. Empty disables the provider.
    pub provider_url: String,
    pub provider_profile: String,
    pub provider_timeout: Duration,
    pub provider_backoff_base: Duration,
    pub provider_backoff_max: Duration,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub seed_mode: SeedMode,
    /// Optional JSON geography profile; the built-in New York profile otherwise.
    pub geo_profile_path: Option<PathBuf>,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values take defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key: &str| lookup(key).map(|s| s.trim().to_string());
        let non_empty = |key: &str| parse(key).filter(|s| !s.is_empty());

        let provider_url =
            parse("SAFEROUTE_PROVIDER_URL").unwrap_or_else(|| DEFAULT_PROVIDER_URL.to_string());
        let timeout_ms: u64 = parse_or(parse("SAFEROUTE_PROVIDER_TIMEOUT_MS"), 5_000);
        let backoff_base_ms = parse_or(parse("SAFEROUTE_PROVIDER_BACKOFF_BASE_MS"), 1_000);
        let backoff_max_ms = parse_or(parse("SAFEROUTE_PROVIDER_BACKOFF_MAX_MS"), 60_000);
        let cache_capacity: usize = parse_or(parse("SAFEROUTE_CACHE_CAPACITY"), 1024);

        Self {
            server_port: parse_or(parse("SAFEROUTE_PORT"), 8000),
            provider_url: provider_url.trim_end_matches('/').to_string(),
            provider_profile: non_empty("SAFEROUTE_PROVIDER_PROFILE")
                .unwrap_or_else(|| "walking".to_string()),
            provider_timeout: Duration::from_millis(timeout_ms.max(MIN_PROVIDER_TIMEOUT_MS)),
            provider_backoff_base: Duration::from_millis(backoff_base_ms),
            provider_backoff_max: Duration::from_millis(backoff_max_ms),
            cache_capacity: cache_capacity.max(1),
            cache_ttl: Duration::from_secs(parse_or(parse("SAFEROUTE_CACHE_TTL_S"), 900)),
            seed_mode: parse_or(parse("SAFEROUTE_SEED_MODE"), SeedMode::default()),
            geo_profile_path: non_empty("SAFEROUTE_GEO_PROFILE").map(PathBuf::from),
            log_json: parse("SAFEROUTE_LOG_FORMAT")
                .map(|s| s.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    pub fn provider_enabled(&self) -> bool {
        !self.provider_url.is_empty()
    }

    /// The configured geography profile, or the built-in New York one.
    pub fn load_geo_profile(&self) -> anyhow::Result<GeoProfile> {
        match &self.geo_profile_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading geography profile {}", path.display()))?;
                GeoProfile::from_json(&raw)
                    .with_context(|| format!("loading geography profile {}", path.display()))
            }
            None => Ok(GeoProfile::new_york()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8000,
            provider_url: String::new(),
            provider_profile: "walking".to_string(),
            provider_timeout: Duration::from_secs(5),
            provider_backoff_base: Duration::from_secs(1),
            provider_backoff_max: Duration::from_secs(60),
            cache_capacity: 1024,
            cache_ttl: Duration::from_secs(900),
            seed_mode: SeedMode::default(),
            geo_profile_path: None,
            log_json: false,
        }
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|s| s.parse().ok()).unwrap_or(default)
}
