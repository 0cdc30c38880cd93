//! Route synthesis facade.
//!
//! Flow per request: validate, consult the cache, try the routing provider
//! under a timeout, fall back to synthesis, score, annotate, cache, notify.

use saferoute_core::alternatives::{alternative_weights, rank_alternatives, RouteAlternative};
use saferoute_core::{
    assemble_route, validate_request, Coordinate, GeoPathSynthesizer, GeoProfile, PathSynthesizer,
    Route, RouteError, RouteSeed, RouteSource, SeedMode,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::backoff::Backoff;
use crate::cache::{RouteCache, RouteKey};
use crate::config::Config;
use crate::notify::{RouteNotifier, TracingNotifier};
use crate::provider::{
    anchor_provider_path, DisabledProvider, OsrmProvider, ProviderError, RoutingProvider,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub start: Coordinate,
    pub end: Coordinate,
    pub safety_weight: f64,
    /// Recompute and overwrite any cached route for this key.
    pub force_refresh: bool,
}

impl RouteRequest {
    pub fn new(start: Coordinate, end: Coordinate, safety_weight: f64) -> Self {
        Self {
            start,
            end,
            safety_weight,
            force_refresh: false,
        }
    }
}

pub struct RouteSynthesisService {
    provider: Arc<dyn RoutingProvider>,
    synthesizer: Arc<dyn PathSynthesizer>,
    notifier: Arc<dyn RouteNotifier>,
    cache: RouteCache,
    seed_mode: SeedMode,
    provider_timeout: Duration,
    backoff: Mutex<Backoff>,
}

impl RouteSynthesisService {
    /// Build the production service from configuration.
    pub fn from_config(config: &Config, profile: Arc<GeoProfile>) -> Self {
        let provider: Arc<dyn RoutingProvider> = if config.provider_enabled() {
            Arc::new(OsrmProvider::from_config(config))
        } else {
            Arc::new(DisabledProvider)
        };
        Self::new(
            config,
            provider,
            Arc::new(GeoPathSynthesizer::new(profile)),
            Arc::new(TracingNotifier),
        )
    }

    pub fn new(
        config: &Config,
        provider: Arc<dyn RoutingProvider>,
        synthesizer: Arc<dyn PathSynthesizer>,
        notifier: Arc<dyn RouteNotifier>,
    ) -> Self {
        Self {
            provider,
            synthesizer,
            notifier,
            cache: RouteCache::new(config.cache_capacity, config.cache_ttl),
            seed_mode: config.seed_mode,
            provider_timeout: config.provider_timeout,
            backoff: Mutex::new(Backoff::new(
                config.provider_backoff_base,
                config.provider_backoff_max,
            )),
        }
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    pub fn seed_mode(&self) -> SeedMode {
        self.seed_mode
    }

    pub async fn compute_route(
        &self,
        start: Coordinate,
        end: Coordinate,
        safety_weight: f64,
    ) -> Result<Arc<Route>, RouteError> {
        self.compute(RouteRequest::new(start, end, safety_weight)).await
    }

    pub async fn compute(&self, request: RouteRequest) -> Result<Arc<Route>, RouteError> {
        let RouteRequest {
            start,
            end,
            safety_weight,
            force_refresh,
        } = request;
        validate_request(start, end, safety_weight)?;

        let key = RouteKey::new(start, end, safety_weight);
        if !force_refresh {
            if let Some(route) = self.cache.get(&key) {
                return Ok(route);
            }
        }

        let seed = RouteSeed::derive(self.seed_mode, start, end);
        let route = match self.fetch_provider_path(start, end).await {
            Some(path) => assemble_route(
                start,
                end,
                safety_weight,
                &seed,
                path,
                RouteSource::Provider,
                None,
            ),
            None => {
                let synthesized = self.synthesizer.synthesize(start, end, &seed);
                assemble_route(
                    start,
                    end,
                    safety_weight,
                    &seed,
                    synthesized.points,
                    RouteSource::Synthesized,
                    Some(synthesized.branch),
                )
            }
        };

        let route = Arc::new(route);
        self.cache.set(key, route.clone());

        let summary = route.summary();
        tracing::info!(
            "Route {} computed: {} ({} threat segments)",
            key,
            summary,
            route.threat_segments.len()
        );
        self.notifier.route_ready(&route, &summary);
        Ok(route)
    }

    /// Routes at evenly spaced safety weights, best ranked first.
    pub async fn compute_alternatives(
        &self,
        start: Coordinate,
        end: Coordinate,
        count: usize,
    ) -> Result<Vec<RouteAlternative>, RouteError> {
        let mut alternatives = Vec::new();
        for weight in alternative_weights(count) {
            let route = self.compute_route(start, end, weight).await?;
            let alternative = RouteAlternative::new(weight, (*route).clone());
            alternatives.push(alternative);
        }
        rank_alternatives(&mut alternatives);
        Ok(alternatives)
    }

    /// Provider path, or `None` when synthesis should take over.
    async fn fetch_provider_path(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Option<Vec<Coordinate>> {
        let outcome = if self.provider_ready() {
            // Dropping the timed-out future cancels the request.
            let fetch = self.provider.fetch_path(start, end);
            match tokio::time::timeout(self.provider_timeout, fetch).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.provider_timeout)),
            }
        } else {
            Err(ProviderError::BackingOff)
        };

        match outcome.and_then(|path| anchor_provider_path(path, start, end)) {
            Ok(path) => {
                if let Ok(mut backoff) = self.backoff.lock() {
                    backoff.reset();
                }
                Some(path)
            }
            Err(ProviderError::Disabled) => None,
            Err(ProviderError::BackingOff) => {
                tracing::debug!("Routing provider backing off, synthesizing path");
                None
            }
            Err(err) => {
                let (delay, failures) = match self.backoff.lock() {
                    Ok(mut backoff) => (backoff.fail(), backoff.failures()),
                    Err(_) => (Duration::ZERO, 0),
                };
                tracing::warn!(
                    "Routing provider failed ({} in a row), falling back to synthesis: {} \
                     (retry in {:?})",
                    failures,
                    err,
                    delay
                );
                None
            }
        }
    }

    fn provider_ready(&self) -> bool {
        self.backoff
            .lock()
            .map(|backoff| backoff.ready())
            .unwrap_or(true)
    }

    /// Consecutive provider failures since the last success.
    pub fn provider_failures(&self) -> u32 {
        self.backoff
            .lock()
            .map(|backoff| backoff.failures())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use saferoute_core::{PathBranch, SynthesizedPath};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const START: Coordinate = Coordinate::new(40.70, -74.00);
    const END: Coordinate = Coordinate::new(40.75, -73.95);

    enum Behavior {
        Path(Vec<Coordinate>),
        Fail,
        Hang,
    }

    struct MockProvider {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RoutingProvider for MockProvider {
        fn fetch_path(
            &self,
            _start: Coordinate,
            _end: Coordinate,
        ) -> BoxFuture<'_, Result<Vec<Coordinate>, ProviderError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                match &self.behavior {
                    Behavior::Path(path) => Ok(path.clone()),
                    Behavior::Fail => Err(ProviderError::Status(503)),
                    Behavior::Hang => {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        Err(ProviderError::NoRoute)
                    }
                }
            })
        }
    }

    struct CountingSynthesizer {
        inner: GeoPathSynthesizer,
        calls: AtomicUsize,
    }

    impl CountingSynthesizer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: GeoPathSynthesizer::new(Arc::new(GeoProfile::new_york())),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PathSynthesizer for CountingSynthesizer {
        fn synthesize(
            &self,
            start: Coordinate,
            end: Coordinate,
            seed: &RouteSeed,
        ) -> SynthesizedPath {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.synthesize(start, end, seed)
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        summaries: Mutex<Vec<String>>,
    }

    impl RouteNotifier for RecordingNotifier {
        fn route_ready(&self, _route: &Route, summary: &str) {
            self.summaries.lock().unwrap().push(summary.to_string());
        }
    }

    fn service(
        provider: Arc<dyn RoutingProvider>,
        synthesizer: Arc<dyn PathSynthesizer>,
        notifier: Arc<dyn RouteNotifier>,
    ) -> RouteSynthesisService {
        let config = Config {
            provider_timeout: Duration::from_secs(5),
            ..Config::default()
        };
        RouteSynthesisService::new(&config, provider, synthesizer, notifier)
    }

    fn quiet_service(
        provider: Arc<dyn RoutingProvider>,
        synthesizer: Arc<dyn PathSynthesizer>,
    ) -> RouteSynthesisService {
        service(provider, synthesizer, Arc::new(TracingNotifier))
    }

    fn offline_service(synthesizer: Arc<CountingSynthesizer>) -> RouteSynthesisService {
        quiet_service(Arc::new(DisabledProvider), synthesizer)
    }

    fn assert_same_route(a: &Route, b: &Route) {
        assert_eq!(a.path, b.path);
        assert_eq!(a.safety_score, b.safety_score);
        assert_eq!(a.distance_km, b.distance_km);
        assert_eq!(a.estimated_time_minutes, b.estimated_time_minutes);
        assert_eq!(a.threat_segments, b.threat_segments);
        assert_eq!(a.source, b.source);
        assert_eq!(a.branch, b.branch);
    }

    #[tokio::test]
    async fn falls_back_to_synthesis_when_provider_fails() {
        let provider = MockProvider::new(Behavior::Fail);
        let synthesizer = CountingSynthesizer::new();
        let svc = quiet_service(provider.clone(), synthesizer.clone());

        let route = svc.compute_route(START, END, 0.5).await.unwrap();
        assert_eq!(route.source, RouteSource::Synthesized);
        assert_eq!(route.branch, Some(PathBranch::Grid));
        assert_eq!(route.path.len(), 10);
        assert_eq!(provider.calls(), 1);
        assert_eq!(synthesizer.calls(), 1);
    }

    #[tokio::test]
    async fn cache_short_circuits_provider_and_synthesizer() {
        let provider = MockProvider::new(Behavior::Fail);
        let synthesizer = CountingSynthesizer::new();
        let svc = quiet_service(provider.clone(), synthesizer.clone());

        let first = svc.compute_route(START, END, 0.5).await.unwrap();
        let near = Coordinate::new(40.70002, -74.00001);
        let second = svc.compute_route(near, END, 0.53).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.calls(), 1);
        assert_eq!(synthesizer.calls(), 1);
    }

    #[tokio::test]
    async fn force_refresh_recomputes_and_overwrites() {
        let synthesizer = CountingSynthesizer::new();
        let svc = offline_service(synthesizer.clone());

        let first = svc.compute_route(START, END, 0.5).await.unwrap();
        let mut request = RouteRequest::new(START, END, 0.5);
        request.force_refresh = true;
        let refreshed = svc.compute(request).await.unwrap();

        assert_eq!(synthesizer.calls(), 2);
        assert!(!Arc::ptr_eq(&first, &refreshed));
        let cached = svc.compute_route(START, END, 0.5).await.unwrap();
        assert!(Arc::ptr_eq(&refreshed, &cached));
    }

    #[tokio::test]
    async fn provider_path_is_used_and_anchored() {
        let provider = MockProvider::new(Behavior::Path(vec![
            Coordinate::new(40.7001, -74.0001),
            Coordinate::new(40.72, -73.98),
            Coordinate::new(40.7499, -73.9499),
        ]));
        let synthesizer = CountingSynthesizer::new();
        let svc = quiet_service(provider.clone(), synthesizer.clone());

        let route = svc.compute_route(START, END, 0.5).await.unwrap();
        assert_eq!(route.source, RouteSource::Provider);
        assert_eq!(route.branch, None);
        assert_eq!(route.path.first(), Some(&START));
        assert_eq!(route.path.last(), Some(&END));
        assert_eq!(synthesizer.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn provider_timeout_falls_through_to_synthesis() {
        let provider = MockProvider::new(Behavior::Hang);
        let synthesizer = CountingSynthesizer::new();
        let svc = quiet_service(provider.clone(), synthesizer.clone());

        let route = svc.compute_route(START, END, 0.5).await.unwrap();
        assert_eq!(route.source, RouteSource::Synthesized);
        assert_eq!(provider.calls(), 1);
        assert_eq!(synthesizer.calls(), 1);
        assert_eq!(svc.cache().len(), 1);
    }

    #[tokio::test]
    async fn failing_provider_is_skipped_while_backing_off() {
        let provider = MockProvider::new(Behavior::Fail);
        let synthesizer = CountingSynthesizer::new();
        let svc = quiet_service(provider.clone(), synthesizer.clone());

        svc.compute_route(START, END, 0.5).await.unwrap();
        assert_eq!(svc.provider_failures(), 1);
        svc.compute_route(START, END, 0.9).await.unwrap();

        assert_eq!(provider.calls(), 1);
        assert_eq!(synthesizer.calls(), 2);
        // A skipped attempt is not another failure.
        assert_eq!(svc.provider_failures(), 1);
    }

    #[tokio::test]
    async fn provider_success_clears_failure_count() {
        let provider = MockProvider::new(Behavior::Path(vec![START, END]));
        let svc = quiet_service(provider.clone(), CountingSynthesizer::new());

        let route = svc.compute_route(START, END, 0.5).await.unwrap();
        assert_eq!(route.source, RouteSource::Provider);
        assert_eq!(svc.provider_failures(), 0);
    }

    #[tokio::test]
    async fn repeated_computation_is_deterministic() {
        let svc = offline_service(CountingSynthesizer::new());
        let start = Coordinate::new(40.7061, -73.9969);
        let end = Coordinate::new(40.6782, -73.9442);

        let first = svc.compute_route(start, end, 0.2).await.unwrap();
        svc.cache().clear();
        let second = svc.compute_route(start, end, 0.2).await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_same_route(&first, &second);
        assert_eq!(first.branch, Some(PathBranch::Crossing));
    }

    #[tokio::test]
    async fn rejects_invalid_input_before_any_work() {
        let provider = MockProvider::new(Behavior::Fail);
        let synthesizer = CountingSynthesizer::new();
        let svc = quiet_service(provider.clone(), synthesizer.clone());

        assert_eq!(
            svc.compute_route(START, START, 0.5).await.unwrap_err(),
            RouteError::DegenerateRoute
        );
        assert!(matches!(
            svc.compute_route(Coordinate::new(0.0, 200.0), END, 0.5).await,
            Err(RouteError::InvalidCoordinate { .. })
        ));
        assert_eq!(provider.calls(), 0);
        assert_eq!(synthesizer.calls(), 0);
        assert!(svc.cache().is_empty());
    }

    #[tokio::test]
    async fn boundary_weights_produce_valid_routes() {
        let svc = offline_service(CountingSynthesizer::new());
        for weight in [0.0, 1.0] {
            let route = svc.compute_route(START, END, weight).await.unwrap();
            assert!(route.validate().is_ok());
            assert!((0.1..=1.0).contains(&route.safety_score));
        }
        let safest = svc.compute_route(START, END, 1.0).await.unwrap();
        assert!(safest.threat_segments.is_empty());
    }

    #[tokio::test]
    async fn notifier_receives_summary_once_per_computation() {
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(
            Arc::new(DisabledProvider),
            CountingSynthesizer::new(),
            notifier.clone(),
        );

        let route = svc.compute_route(START, END, 0.5).await.unwrap();
        svc.compute_route(START, END, 0.5).await.unwrap();

        let summaries = notifier.summaries.lock().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0], route.summary());
    }

    #[tokio::test]
    async fn alternatives_are_ranked_and_classified() {
        let svc = offline_service(CountingSynthesizer::new());
        let alternatives = svc.compute_alternatives(START, END, 3).await.unwrap();

        assert_eq!(alternatives.len(), 3);
        for pair in alternatives.windows(2) {
            assert!(pair[0].rank_score() >= pair[1].rank_score());
        }
        let mut kinds: Vec<_> = alternatives.iter().map(|alt| alt.kind).collect();
        kinds.sort_by_key(|kind| *kind as u8);
        assert_eq!(
            kinds,
            vec![
                saferoute_core::RouteKind::Fastest,
                saferoute_core::RouteKind::Balanced,
                saferoute_core::RouteKind::Safest
            ]
        );
    }

    #[tokio::test]
    async fn alternatives_carry_the_weight_their_route_was_built_for() {
        let synthesizer = CountingSynthesizer::new();
        let svc = offline_service(synthesizer.clone());
        let alternatives = svc.compute_alternatives(START, END, 4).await.unwrap();

        let mut weights: Vec<f64> = alternatives.iter().map(|alt| alt.safety_weight).collect();
        weights.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(weights, vec![0.1, 0.4, 0.6, 0.9]);
        assert_eq!(synthesizer.calls(), 4);

        for alt in &alternatives {
            let direct = svc.compute_route(START, END, alt.safety_weight).await.unwrap();
            assert_same_route(&alt.route, &direct);
        }
        assert_eq!(synthesizer.calls(), 4);
    }
}
