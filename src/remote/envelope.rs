// =============================================================================
// Response Envelopes — `{ status: "success" | other, ...payload }`
// =============================================================================
//
// The remote answers HTTP 200 even when an operation failed, signalling the
// failure through `status`. A non-success status or a missing/malformed
// payload is always an error, never an empty success.
//
// `/signals` returns an array of signal sets while `/generate-signals`
// returns a single object; both are adapted into one `SignalSet`.
// =============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::remote::error::FetchError;
use crate::types::{EconomicEvent, SignalSet};

const SUCCESS: &str = "success";

/// `GET /signals` payload.
#[derive(Debug, Deserialize)]
struct SignalsPayload {
    signals: Vec<SignalSet>,
}

/// `GET /generate-signals` payload.
#[derive(Debug, Deserialize)]
struct GeneratePayload {
    #[serde(default)]
    message: Option<String>,
    signals: SignalSet,
}

/// `GET /events` payload.
#[derive(Debug, Deserialize)]
struct EventsPayload {
    data: Vec<EconomicEvent>,
}

/// `GET /scrape/<source>` payload.
#[derive(Debug, Deserialize)]
struct ScrapePayload {
    data: Vec<EconomicEvent>,
    db_result: ScrapeCounts,
}

/// Records created / updated by a scrape cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeCounts {
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub updated: u64,
}

/// Freshly generated signals plus the server's message.
#[derive(Debug, Clone)]
pub struct GeneratedSignals {
    pub set: SignalSet,
    pub message: Option<String>,
}

/// Events produced by a scrape cycle.
#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub events: Vec<EconomicEvent>,
    pub counts: ScrapeCounts,
}

/// Check the envelope status and decode the payload from the same object.
fn unwrap_envelope<T: DeserializeOwned>(
    endpoint: &str,
    body: serde_json::Value,
) -> Result<T, FetchError> {
    let status = body
        .get("status")
        .and_then(|s| s.as_str())
        .ok_or_else(|| FetchError::Decode {
            endpoint: endpoint.to_string(),
            detail: "missing 'status' field".to_string(),
        })?;

    if status != SUCCESS {
        let message = body
            .get("message")
            .or_else(|| body.get("details"))
            .and_then(|m| m.as_str())
            .unwrap_or("no message")
            .to_string();
        return Err(FetchError::Envelope {
            endpoint: endpoint.to_string(),
            status: status.to_string(),
            message,
        });
    }

    serde_json::from_value(body).map_err(|e| FetchError::Decode {
        endpoint: endpoint.to_string(),
        detail: e.to_string(),
    })
}

/// Latest-dated set of an undated `/signals` response. The remote lists
/// sets in ascending date order. `None` when the array is empty.
pub fn decode_latest_signals(
    endpoint: &str,
    body: serde_json::Value,
) -> Result<Option<SignalSet>, FetchError> {
    let payload: SignalsPayload = unwrap_envelope(endpoint, body)?;
    Ok(payload.signals.into_iter().max_by_key(|set| set.date))
}

/// The set of a `/signals?date=` response, `None` when nothing exists for
/// that date.
pub fn decode_signals_for_date(
    endpoint: &str,
    body: serde_json::Value,
) -> Result<Option<SignalSet>, FetchError> {
    let payload: SignalsPayload = unwrap_envelope(endpoint, body)?;
    Ok(payload.signals.into_iter().next())
}

pub fn decode_generated(
    endpoint: &str,
    body: serde_json::Value,
) -> Result<GeneratedSignals, FetchError> {
    let payload: GeneratePayload = unwrap_envelope(endpoint, body)?;
    Ok(GeneratedSignals {
        set: payload.signals,
        message: payload.message,
    })
}

pub fn decode_events(
    endpoint: &str,
    body: serde_json::Value,
) -> Result<Vec<EconomicEvent>, FetchError> {
    let payload: EventsPayload = unwrap_envelope(endpoint, body)?;
    Ok(payload.data)
}

pub fn decode_scrape(
    endpoint: &str,
    body: serde_json::Value,
) -> Result<ScrapeResult, FetchError> {
    let payload: ScrapePayload = unwrap_envelope(endpoint, body)?;
    Ok(ScrapeResult {
        events: payload.data,
        counts: payload.db_result,
    })
}
