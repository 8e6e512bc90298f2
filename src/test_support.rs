// Test helpers: an in-process mock of the remote API and fixture builders.

use std::sync::Arc;

use axum::Router;
use chrono::NaiveDate;
use serde_json::json;

use crate::app_state::AppState;
use crate::remote::ApiClient;
use crate::runtime_config::RuntimeConfig;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server failed");
    });
    format!("http://{addr}")
}

/// Client pointed at `base` for both data calls and the health probe.
pub fn client_for(base: &str) -> ApiClient {
    ApiClient::new(&config_for(base)).expect("build client")
}

pub fn config_for(base: &str) -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.api_base_url = base.to_string();
    config.health_url = format!("{base}/");
    config.request_timeout_secs = 5;
    config
}

/// Shared state backed by a mock server running `router`.
pub async fn state_for(router: Router, today: NaiveDate) -> Arc<AppState> {
    let base = serve(router).await;
    let config = config_for(&base);
    let api = ApiClient::new(&config).expect("build client");
    Arc::new(AppState::new(config, api, today))
}

/// A stored signal set as the remote returns it.
pub fn signal_set_json(date: &str) -> serde_json::Value {
    json!({
        "_id": format!("id-{date}"),
        "market_summary": format!("Summary for {date}"),
        "signals": [
            { "pair": "EUR/USD", "direction": "BUY", "strength": "HIGH",
              "confidence": "80%", "rationale": "ECB hawkish", "impact": "HIGH" },
            { "pair": "USD/JPY", "direction": "SELL", "strength": "LOW",
              "confidence": "55%", "rationale": "BoJ intervention risk", "impact": "MEDIUM" }
        ],
        "date": date,
        "timestamp": format!("{date}T07:45:00.000000"),
        "createdAt": format!("{date}T07:45:00"),
        "updatedAt": format!("{date}T07:45:00")
    })
}

/// An economic event row as the remote returns it.
pub fn event_json(country: &str, impact: &str, source: &str) -> serde_json::Value {
    json!({
        "date": "2024-01-01",
        "time": "08:30",
        "country": country,
        "event": format!("{country} data release"),
        "impact": impact,
        "actual": null,
        "forecast": "1.0",
        "previous": "0.9",
        "source": source
    })
}
