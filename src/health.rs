// =============================================================================
// Health Monitor — periodic liveness probe of the remote API
// =============================================================================
//
// Runs as a background Tokio task with an explicit lifecycle:
//
//   let monitor = HealthMonitor::start(Arc::clone(&state), interval);
//   ...
//   monitor.stop().await;
//
// The first probe fires immediately, then once per interval. The task only
// writes the status indicator; it never blocks or gates any other fetch.
// Dropping the monitor without calling `stop` aborts the task.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::types::ServerStatus;

/// Status indicator plus bookkeeping of the last probe.
#[derive(Debug, Clone, Default)]
pub struct HealthState {
    pub status: ServerStatus,
    pub last_checked: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub status: ServerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

impl HealthState {
    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            status: self.status,
            last_checked: self.last_checked,
            consecutive_failures: self.consecutive_failures,
        }
    }
}

/// Run one probe and record its outcome.
pub async fn check_once(state: &AppState) -> ServerStatus {
    {
        state.health.write().status = ServerStatus::Checking;
    }
    state.increment_version();

    let status = state.api.probe_health().await;

    let previous = {
        let mut health = state.health.write();
        let previous_failures = health.consecutive_failures;
        health.status = status;
        health.last_checked = Some(Utc::now());
        health.consecutive_failures = match status {
            ServerStatus::Online => 0,
            _ => previous_failures.saturating_add(1),
        };
        previous_failures
    };
    state.increment_version();

    match status {
        ServerStatus::Online if previous > 0 => info!("remote API back online"),
        ServerStatus::Online => debug!("remote API online"),
        _ => warn!(consecutive_failures = previous + 1, "remote API offline"),
    }
    status
}

/// Handle to the running probe task.
pub struct HealthMonitor {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl HealthMonitor {
    /// Spawn the probe loop.
    pub fn start(state: Arc<AppState>, period: Duration) -> Self {
        let (tx, mut rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            info!(interval_secs = period.as_secs(), "Health monitor started");
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut rx => break,
                    _ = ticker.tick() => {
                        tokio::select! {
                            _ = &mut rx => break,
                            _ = check_once(&state) => {}
                        }
                    }
                }
            }
            info!("Health monitor stopped");
        });

        Self {
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    /// Signal the loop to exit and wait for it.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "health monitor task ended abnormally");
            }
        }
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime_config::RuntimeConfig;
    use crate::remote::ApiClient;
    use crate::test_support::serve;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn state_with_health(router: Router) -> Arc<AppState> {
        let base = serve(router).await;
        let mut config = RuntimeConfig::default();
        config.api_base_url = base.clone();
        config.health_url = format!("{base}/");
        let api = ApiClient::new(&config).unwrap();
        Arc::new(AppState::new(config, api, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
    }

    #[tokio::test]
    async fn check_once_records_online() {
        let state = state_with_health(Router::new().route("/", get(|| async { "ok" }))).await;
        assert_eq!(check_once(&state).await, ServerStatus::Online);
        let health = state.health.read();
        assert_eq!(health.status, ServerStatus::Online);
        assert!(health.last_checked.is_some());
        assert_eq!(health.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn check_once_counts_failures() {
        let state = state_with_health(
            Router::new().route("/", get(|| async { StatusCode::BAD_GATEWAY })),
        )
        .await;
        check_once(&state).await;
        check_once(&state).await;
        let health = state.health.read();
        assert_eq!(health.status, ServerStatus::Offline);
        assert_eq!(health.consecutive_failures, 2);
    }

    #[tokio::test]
    async fn monitor_polls_until_stopped() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    "ok"
                }
            }),
        );
        let state = state_with_health(router).await;

        let monitor = HealthMonitor::start(state.clone(), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(180)).await;
        monitor.stop().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let after_stop = hits.load(Ordering::SeqCst);
        assert!(after_stop >= 2, "expected repeated probes, got {after_stop}");
        assert_eq!(state.health.read().status, ServerStatus::Online);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(hits.load(Ordering::SeqCst), after_stop);
    }
}
