// =============================================================================
// Remote API Client — plain HTTP GET against the signal / calendar service
// =============================================================================
//
// Every call is independent and never retried automatically; retries are
// user-initiated. The liveness probe uses its own short-timeout client so a
// slow generation request never delays the status indicator.
// =============================================================================

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use crate::filters::FilterCriteria;
use crate::remote::envelope::{self, GeneratedSignals, ScrapeResult};
use crate::remote::error::FetchError;
use crate::runtime_config::RuntimeConfig;
use crate::types::{EconomicEvent, ScrapeSource, ServerStatus, SignalSet};

/// HTTP client for the remote API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    health_url: String,
    client: reqwest::Client,
    health_client: reqwest::Client,
}

impl ApiClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("failed to build API HTTP client")?;

        let health_client = reqwest::Client::builder()
            .timeout(config.health_timeout())
            .build()
            .context("failed to build health-check HTTP client")?;

        let base_url = config.api_base_url.trim_end_matches('/').to_string();
        debug!(base_url = %base_url, health_url = %config.health_url, "ApiClient initialised");

        Ok(Self {
            base_url,
            health_url: config.health_url.clone(),
            client,
            health_client,
        })
    }

    // -------------------------------------------------------------------------
    // Signals
    // -------------------------------------------------------------------------

    /// GET /signals — the current (latest-dated) signal set.
    #[instrument(skip(self), name = "remote::fetch_current_signals")]
    pub async fn fetch_current_signals(&self) -> Result<Option<SignalSet>, FetchError> {
        let body = self.get_json("/signals", &[]).await?;
        let set = envelope::decode_latest_signals("/signals", body)?;
        debug!(found = set.is_some(), "current signals fetched");
        Ok(set)
    }

    /// GET /signals?date=YYYY-MM-DD — `None` when nothing exists for `date`.
    #[instrument(skip(self), name = "remote::fetch_signals_for_date")]
    pub async fn fetch_signals_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Option<SignalSet>, FetchError> {
        let query = [("date", date.format("%Y-%m-%d").to_string())];
        let body = self.get_json("/signals", &query).await?;
        let set = envelope::decode_signals_for_date("/signals", body)?;
        debug!(%date, found = set.is_some(), "signals for date fetched");
        Ok(set)
    }

    /// GET /generate-signals — runs generation server-side and returns the
    /// fresh set.
    #[instrument(skip(self), name = "remote::generate_signals")]
    pub async fn generate_signals(&self) -> Result<GeneratedSignals, FetchError> {
        let body = self.get_json("/generate-signals", &[]).await?;
        let generated = envelope::decode_generated("/generate-signals", body)?;
        debug!(
            date = %generated.set.date,
            count = generated.set.signals.len(),
            "signals generated"
        );
        Ok(generated)
    }

    // -------------------------------------------------------------------------
    // Economic events
    // -------------------------------------------------------------------------

    /// GET /events with the canonical query for `criteria`.
    #[instrument(skip(self), name = "remote::fetch_events")]
    pub async fn fetch_events(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<EconomicEvent>, FetchError> {
        let query = criteria.to_query_pairs();
        let body = self.get_json("/events", &query).await?;
        let events = envelope::decode_events("/events", body)?;
        debug!(count = events.len(), "events fetched");
        Ok(events)
    }

    /// GET /scrape/<source> — triggers an ingest cycle.
    #[instrument(skip(self), name = "remote::scrape_events")]
    pub async fn scrape_events(&self, source: ScrapeSource) -> Result<ScrapeResult, FetchError> {
        let body = self.get_json(source.path(), &[]).await?;
        let result = envelope::decode_scrape(source.path(), body)?;
        debug!(
            %source,
            count = result.events.len(),
            created = result.counts.created,
            updated = result.counts.updated,
            "scrape completed"
        );
        Ok(result)
    }

    // -------------------------------------------------------------------------
    // Liveness
    // -------------------------------------------------------------------------

    /// GET on the health URL. Exactly HTTP 200 means online.
    #[instrument(skip(self), name = "remote::probe_health")]
    pub async fn probe_health(&self) -> ServerStatus {
        match self.health_client.get(&self.health_url).send().await {
            Ok(resp) if resp.status() == reqwest::StatusCode::OK => ServerStatus::Online,
            Ok(resp) => {
                warn!(status = %resp.status(), "health probe returned non-200");
                ServerStatus::Offline
            }
            Err(e) => {
                warn!(error = %e, "health probe failed");
                ServerStatus::Offline
            }
        }
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.client.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let resp = request.send().await.map_err(|source| FetchError::Transport {
            endpoint: path.to_string(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        resp.json::<serde_json::Value>().await.map_err(|source| {
            if source.is_decode() {
                FetchError::Decode {
                    endpoint: path.to_string(),
                    detail: source.to_string(),
                }
            } else {
                FetchError::Transport {
                    endpoint: path.to_string(),
                    source,
                }
            }
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("health_url", &self.health_url)
            .finish()
    }
}
