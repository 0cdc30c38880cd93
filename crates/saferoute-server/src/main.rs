//! SafeRoute server - deterministic safe-route synthesis over HTTP.

use anyhow::Result;
use saferoute_server::config::Config;
use saferoute_server::loops::cache_prune_loop;
use saferoute_server::state::AppState;
use saferoute_server::{api, telemetry};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    telemetry::init_tracing(config.log_json)?;

    tracing::info!("Starting SafeRoute server...");

    let profile = config.load_geo_profile()?;
    tracing::info!(
        "Geography profile '{}' with {} crossings, seed mode {:?}",
        profile.name,
        profile.crossings.len(),
        config.seed_mode
    );
    if config.provider_enabled() {
        tracing::info!(
            "Routing provider {} ({}), timeout {:?}",
            config.provider_url,
            config.provider_profile,
            config.provider_timeout
        );
    } else {
        tracing::info!("Routing provider disabled, all paths will be synthesized");
    }

    let state = Arc::new(AppState::new(&config, Arc::new(profile)));
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    tokio::spawn(cache_prune_loop::run_cache_prune_loop(
        state.clone(),
        Duration::from_secs(cache_prune_loop::LOOP_INTERVAL_SECS),
        shutdown_tx.subscribe(),
    ));

    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for shutdown signal: {}", err);
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(());
    Ok(())
}
