// =============================================================================
// FX Signal Desk — Main Entry Point
// =============================================================================
//
// Loads configuration, kicks off the initial fetch for every view, starts the
// health monitor and serves the local REST / WebSocket API until Ctrl+C.
// The config file is never written back.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod dispatch;
mod filters;
mod health;
mod remote;
mod runtime_config;
mod signals;
mod types;
mod views;
mod week;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::dispatch::Action;
use crate::health::HealthMonitor;
use crate::remote::ApiClient;
use crate::runtime_config::{RuntimeConfig, CONFIG_FILE};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        FX Signal Desk — Starting Up                     ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = RuntimeConfig::load(CONFIG_FILE).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env_overrides();

    info!(
        api_base_url = %config.api_base_url,
        health_url = %config.health_url,
        health_interval_secs = config.health_interval_secs,
        "Remote API configured"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let api = ApiClient::new(&config)?;
    let today = chrono::Local::now().date_naive();
    let bind_addr = config.bind_addr.clone();
    let health_interval = config.health_interval();
    let state = Arc::new(AppState::new(config, api, today));

    // ── 3. Initial fetches (independent, in parallel) ────────────────────
    for action in [
        Action::RefreshDashboard,
        Action::SelectDate(today),
        Action::LoadEvents,
    ] {
        if let Err(e) = dispatch::spawn(&state, action) {
            error!(error = %e, "initial dispatch failed");
        }
    }

    // ── 4. Health monitor ────────────────────────────────────────────────
    let monitor = HealthMonitor::start(state.clone(), health_interval);

    // ── 5. API server ────────────────────────────────────────────────────
    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");
    info!("All subsystems running. Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for Ctrl+C");
            }
            warn!("Shutdown signal received — stopping gracefully");
        })
        .await
        .context("API server failed")?;

    // ── 6. Shutdown ──────────────────────────────────────────────────────
    monitor.stop().await;

    info!("FX Signal Desk shut down complete.");
    Ok(())
}
