//! Cache prune loop.
//!
//! Sweeps expired routes so entries nobody asks for again don't sit in the
//! cache until capacity pressure evicts them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;

use crate::state::AppState;

pub const LOOP_INTERVAL_SECS: u64 = 60;

pub async fn run_cache_prune_loop(
    state: Arc<AppState>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(period.max(Duration::from_millis(1)));

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Cache prune loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let removed = state.service.cache().prune_expired();
                if removed > 0 {
                    tracing::debug!(
                        "Pruned {} expired routes, {} cached",
                        removed,
                        state.service.cache().len()
                    );
                }
            }
        }
    }
}
