// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Read endpoints return view snapshots;
// action endpoints dispatch in the background and answer `202 Accepted` with
// the dispatch ticket. The final result shows up in the next snapshot.
//
// CORS is configured permissively; the front end is served from another
// origin during development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::dispatch::{self, Action, DispatchError, Ticket};
use crate::filters::{FilterDimension, FilterUpdate};
use crate::signals::SignalTab;
use crate::types::ScrapeSource;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into() })),
    )
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/state", get(full_state))
        // ── Dashboard ───────────────────────────────────────────────
        .route("/api/v1/dashboard", get(dashboard))
        .route("/api/v1/dashboard/view", post(dashboard_view))
        .route("/api/v1/dashboard/refresh", post(dashboard_refresh))
        // ── Weekly ──────────────────────────────────────────────────
        .route("/api/v1/weekly", get(weekly))
        .route("/api/v1/weekly/select", post(weekly_select))
        .route("/api/v1/weekly/generate", post(weekly_generate))
        // ── Events ──────────────────────────────────────────────────
        .route("/api/v1/events", get(events))
        .route("/api/v1/events/filter", post(events_filter))
        .route("/api/v1/events/dates", post(events_dates))
        .route("/api/v1/events/reset", post(events_reset))
        .route("/api/v1/events/refresh", post(events_refresh))
        .route("/api/v1/events/scrape", post(events_scrape))
        // ── WebSocket (handled in the ws module but mounted here) ───
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health & full state
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    remote: crate::types::ServerStatus,
    state_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        remote: state.health.read().status,
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

async fn full_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

// =============================================================================
// Action plumbing
// =============================================================================

fn accepted(state: &Arc<AppState>, action: Action) -> Result<impl IntoResponse, ApiError> {
    let ticket: Ticket = dispatch::spawn(state, action).map_err(|e| match e {
        DispatchError::InvalidWeekDay(_) => bad_request(e.to_string()),
    })?;
    Ok((StatusCode::ACCEPTED, Json(ticket)))
}

// =============================================================================
// Dashboard
// =============================================================================

/// Tab / search selection; used both as the GET query and the POST body.
#[derive(Debug, Deserialize)]
struct DashboardSelection {
    tab: Option<String>,
    search: Option<String>,
}

fn parse_tab(raw: Option<&str>) -> Result<Option<SignalTab>, ApiError> {
    raw.map(|raw| {
        serde_json::from_value::<SignalTab>(json!(raw.to_lowercase())).map_err(|_| {
            bad_request(format!("Invalid tab: '{raw}'. Use all, buy, sell or neutral."))
        })
    })
    .transpose()
}

/// Current dashboard. `tab` / `search` shape this response only; the stored
/// selection is changed through `POST /api/v1/dashboard/view`.
async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardSelection>,
) -> Result<impl IntoResponse, ApiError> {
    let tab = parse_tab(query.tab.as_deref())?;
    let snapshot = {
        let view = state.dashboard.read();
        view.snapshot_with(
            tab.unwrap_or(view.tab),
            query.search.as_deref().unwrap_or(&view.search),
        )
    };
    Ok(Json(snapshot))
}

/// Store the tab / search selection shown in `/state` and the WS feed.
async fn dashboard_view(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DashboardSelection>,
) -> Result<impl IntoResponse, ApiError> {
    let tab = parse_tab(req.tab.as_deref())?;
    let snapshot = {
        let mut view = state.dashboard.write();
        if let Some(tab) = tab {
            view.tab = tab;
        }
        if let Some(search) = req.search {
            view.search = search;
        }
        view.snapshot()
    };
    state.increment_version();
    Ok(Json(snapshot))
}

async fn dashboard_refresh(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Dashboard refresh requested via API");
    accepted(&state, Action::RefreshDashboard)
}

// =============================================================================
// Weekly
// =============================================================================

async fn weekly(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.weekly.read().snapshot())
}

/// Either a calendar `date` or a week-button `day` index (0 = Monday).
#[derive(Debug, Deserialize)]
struct SelectRequest {
    date: Option<NaiveDate>,
    day: Option<usize>,
}

async fn weekly_select(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let action = match (req.date, req.day) {
        (Some(date), None) => Action::SelectDate(date),
        (None, Some(day)) => Action::SelectWeekDay(day),
        _ => return Err(bad_request("Provide exactly one of 'date' or 'day'")),
    };
    accepted(&state, action)
}

async fn weekly_generate(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Signal generation requested via API");
    accepted(&state, Action::GenerateSignals)
}

// =============================================================================
// Events
// =============================================================================

async fn events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.events.read().snapshot())
}

#[derive(Debug, Deserialize)]
struct FilterRequest {
    dimension: FilterDimension,
    value: String,
}

async fn events_filter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FilterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let update = FilterUpdate::from_select(req.dimension, &req.value).map_err(|e| {
        warn!(dimension = ?req.dimension, value = %req.value, error = %e, "rejected filter update");
        bad_request(e)
    })?;
    accepted(&state, Action::ApplyFilter(update))
}

/// Absent fields are left unchanged; an explicit `null` clears the bound.
#[derive(Debug, Deserialize)]
struct DatesRequest {
    #[serde(default, with = "double_option")]
    start_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "double_option")]
    end_date: Option<Option<NaiveDate>>,
}

mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

async fn events_dates(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DatesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut updates = Vec::new();
    if let Some(start) = req.start_date {
        updates.push(FilterUpdate::StartDate(start));
    }
    if let Some(end) = req.end_date {
        updates.push(FilterUpdate::EndDate(end));
    }
    let Some(last) = updates.pop() else {
        return Err(bad_request("Provide 'start_date' and/or 'end_date'"));
    };

    // Fold all but the last into the criteria directly so a single fetch
    // covers both bounds.
    if !updates.is_empty() {
        let mut view = state.events.write();
        for update in updates {
            view.filters = view.filters.merged(update);
        }
    }
    accepted(&state, Action::ApplyFilter(last))
}

async fn events_reset(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    accepted(&state, Action::ResetFilters)
}

async fn events_refresh(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    accepted(&state, Action::LoadEvents)
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeRequest {
    source: Option<ScrapeSource>,
}

async fn events_scrape(
    State(state): State<Arc<AppState>>,
    body: Option<Json<ScrapeRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let source = body.and_then(|Json(req)| req.source);
    info!(source = ?source, "Scrape requested via API");
    accepted(&state, Action::Scrape(source))
}
