//! Provider backoff after consecutive failures.
//!
//! While the provider is backing off, requests skip it and go straight to
//! synthesis, so an outage costs one timeout instead of one per request.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
    failures: u32,
    next_attempt_at: Instant,
    jitter_ratio: f64,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let base = base.max(Duration::from_millis(1));
        Self {
            base,
            max: max.max(base),
            current: base,
            failures: 0,
            next_attempt_at: Instant::now(),
            jitter_ratio: 0.2,
        }
    }

    pub fn ready(&self) -> bool {
        Instant::now() >= self.next_attempt_at
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn reset(&mut self) {
        self.current = self.base;
        self.failures = 0;
        self.next_attempt_at = Instant::now();
    }

    /// Record a failure and return the delay before the next attempt.
    ///
    /// The first failure waits `base`; each further failure doubles the wait
    /// up to `max`.
    pub fn fail(&mut self) -> Duration {
        if self.failures > 0 {
            self.current = self.current.saturating_mul(2).min(self.max);
        }
        self.failures = self.failures.saturating_add(1);
        let delay = with_jitter(self.current, self.jitter_ratio);
        self.next_attempt_at = Instant::now() + delay;
        delay
    }
}

fn with_jitter(delay: Duration, ratio: f64) -> Duration {
    let jitter_cap_ms = (delay.as_millis() as f64 * ratio) as u64;
    if jitter_cap_ms == 0 {
        return delay;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    delay + Duration::from_millis(nanos % (jitter_cap_ms + 1))
}
