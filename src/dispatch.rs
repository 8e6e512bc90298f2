// =============================================================================
// Dispatch — user actions: update view state, fetch, apply the result
// =============================================================================
//
// Every action runs in two phases:
//   1. `prepare` (synchronous, under the view's write lock): merge the new
//      selection / filter into the view, take the slot's next sequence
//      number and capture the request parameters.
//   2. `execute` (async, no lock held): call the remote API, then settle the
//      slot with the result. Older responses are discarded by the slot.
//
// `spawn` runs phase 2 as a fire-and-forget task and returns the ticket at
// once; `run` awaits it (startup and tests).
// =============================================================================

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::filters::{FilterCriteria, FilterUpdate};
use crate::remote::FetchError;
use crate::signals::stale_warning;
use crate::types::ScrapeSource;
use crate::views::Resolution;

const DASHBOARD_ERROR: &str = "Failed to fetch forex data. Please try again later.";
const WEEKLY_ERROR: &str = "Failed to fetch signals for the selected date.";
const GENERATE_ERROR: &str = "Failed to generate signals. Please try again.";
const EVENTS_ERROR: &str = "Failed to load events. Please try again.";
const SCRAPE_ERROR: &str = "Failed to fetch scraped data. Please try again.";

/// A user-triggered action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RefreshDashboard,
    /// Calendar pick: re-anchors the week when needed, then fetches.
    SelectDate(NaiveDate),
    /// Week-button pick (0 = Monday): keeps the week, fetches that day.
    SelectWeekDay(usize),
    GenerateSignals,
    /// Re-fetch events with the current filters.
    LoadEvents,
    ApplyFilter(FilterUpdate),
    ResetFilters,
    Scrape(Option<ScrapeSource>),
}

/// View a dispatch writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Dashboard,
    Weekly,
    Events,
}

impl ViewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Weekly => "weekly",
            Self::Events => "events",
        }
    }
}

/// Handed back when an action has been dispatched.
#[derive(Debug, Clone, Serialize)]
pub struct Ticket {
    pub view: ViewKind,
    pub seq: u64,
    pub request_id: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    #[error("week day index {0} is out of range (0-6)")]
    InvalidWeekDay(usize),
}

/// Request parameters captured in phase 1.
#[derive(Debug)]
enum Request {
    Dashboard { today: NaiveDate },
    SignalsForDate { date: NaiveDate },
    Generate,
    Events { criteria: FilterCriteria },
    Scrape { source: ScrapeSource },
}

#[derive(Debug)]
struct Prepared {
    ticket: Ticket,
    request: Request,
}

fn new_ticket(view: ViewKind, seq: u64) -> Ticket {
    Ticket {
        view,
        seq,
        request_id: Uuid::new_v4().to_string(),
    }
}

// =============================================================================
// Phase 1 — prepare
// =============================================================================

fn prepare(state: &AppState, action: Action) -> Result<Prepared, DispatchError> {
    let prepared = match action {
        Action::RefreshDashboard => {
            let seq = state.dashboard.write().signals.begin();
            Prepared {
                ticket: new_ticket(ViewKind::Dashboard, seq),
                request: Request::Dashboard {
                    today: Local::now().date_naive(),
                },
            }
        }
        Action::SelectDate(date) => {
            let seq = {
                let mut weekly = state.weekly.write();
                weekly.selection.select(date);
                weekly.signals.begin()
            };
            Prepared {
                ticket: new_ticket(ViewKind::Weekly, seq),
                request: Request::SignalsForDate { date },
            }
        }
        Action::SelectWeekDay(index) => {
            let (seq, date) = {
                let mut weekly = state.weekly.write();
                let date = weekly
                    .selection
                    .select_day(index)
                    .ok_or(DispatchError::InvalidWeekDay(index))?;
                (weekly.signals.begin(), date)
            };
            Prepared {
                ticket: new_ticket(ViewKind::Weekly, seq),
                request: Request::SignalsForDate { date },
            }
        }
        Action::GenerateSignals => {
            let seq = {
                let mut weekly = state.weekly.write();
                weekly.start_generating();
                weekly.signals.begin()
            };
            Prepared {
                ticket: new_ticket(ViewKind::Weekly, seq),
                request: Request::Generate,
            }
        }
        Action::LoadEvents => {
            let (seq, criteria) = {
                let mut events = state.events.write();
                (events.events.begin(), events.filters.clone())
            };
            Prepared {
                ticket: new_ticket(ViewKind::Events, seq),
                request: Request::Events { criteria },
            }
        }
        Action::ApplyFilter(update) => {
            let (seq, criteria) = {
                let mut events = state.events.write();
                events.filters = events.filters.merged(update);
                (events.events.begin(), events.filters.clone())
            };
            Prepared {
                ticket: new_ticket(ViewKind::Events, seq),
                request: Request::Events { criteria },
            }
        }
        Action::ResetFilters => {
            let seq = {
                let mut events = state.events.write();
                events.filters = FilterCriteria::default();
                events.events.begin()
            };
            Prepared {
                ticket: new_ticket(ViewKind::Events, seq),
                request: Request::Events {
                    criteria: FilterCriteria::default(),
                },
            }
        }
        Action::Scrape(source) => {
            let source = source.unwrap_or(state.runtime_config.read().default_scrape_source);
            let seq = state.events.write().events.begin();
            Prepared {
                ticket: new_ticket(ViewKind::Events, seq),
                request: Request::Scrape { source },
            }
        }
    };

    state.increment_version();
    debug!(
        view = prepared.ticket.view.as_str(),
        seq = prepared.ticket.seq,
        request_id = %prepared.ticket.request_id,
        "action dispatched"
    );
    Ok(prepared)
}

// =============================================================================
// Phase 2 — execute
// =============================================================================

fn record_failure(state: &AppState, ticket: &Ticket, err: &FetchError) {
    warn!(
        view = ticket.view.as_str(),
        seq = ticket.seq,
        request_id = %ticket.request_id,
        endpoint = err.endpoint(),
        error = %err,
        "fetch failed"
    );
    state.push_error(ticket.view.as_str(), err, &ticket.request_id);
}

async fn execute(state: &AppState, prepared: Prepared) -> Resolution {
    let Prepared { ticket, request } = prepared;
    let seq = ticket.seq;

    let resolution = match request {
        Request::Dashboard { today } => match state.api.fetch_current_signals().await {
            Ok(set) => {
                if let Some(set) = &set {
                    let unparsed = set
                        .signals
                        .iter()
                        .filter(|s| s.confidence_pct().is_none())
                        .count();
                    if unparsed > 0 {
                        warn!(unparsed, "signals with unreadable confidence");
                    }
                }
                let warning = set.as_ref().and_then(|s| stale_warning(s.date, today));
                if let Some(w) = &warning {
                    warn!(warning = %w, "displayed signals are stale");
                }
                let mut view = state.dashboard.write();
                let resolution = view.signals.apply(seq, set, None);
                if resolution == Resolution::Applied {
                    view.stale_warning = warning;
                }
                resolution
            }
            Err(e) => {
                record_failure(state, &ticket, &e);
                state.dashboard.write().signals.fail(seq, DASHBOARD_ERROR)
            }
        },

        Request::SignalsForDate { date } => match state.api.fetch_signals_for_date(date).await {
            Ok(set) => {
                if set.is_none() {
                    info!(%date, "no signals for selected date");
                }
                state.weekly.write().signals.apply(seq, set, None)
            }
            Err(e) => {
                record_failure(state, &ticket, &e);
                state.weekly.write().signals.fail(seq, WEEKLY_ERROR)
            }
        },

        Request::Generate => {
            let result = state.api.generate_signals().await;
            let mut weekly = state.weekly.write();
            weekly.finish_generating();
            match result {
                Ok(generated) => {
                    let date = generated.set.date;
                    let count = generated.set.signals.len();
                    let notice = match generated.message {
                        Some(message) => format!("{message} ({count} signals for {date})"),
                        None => format!("Successfully generated {count} signals for {date}."),
                    };
                    let resolution = weekly.signals.apply(seq, Some(generated.set), Some(notice));
                    if resolution == Resolution::Applied {
                        // Keep the selector on the day the set belongs to.
                        weekly.selection.select(date);
                    }
                    resolution
                }
                Err(e) => {
                    drop(weekly);
                    record_failure(state, &ticket, &e);
                    state.weekly.write().signals.fail(seq, GENERATE_ERROR)
                }
            }
        }

        Request::Events { criteria } => match state.api.fetch_events(&criteria).await {
            Ok(events) => {
                let notice = format!("Successfully loaded {} events from database", events.len());
                let value = (!events.is_empty()).then_some(events);
                let mut view = state.events.write();
                let resolution = view.events.apply(seq, value, Some(notice));
                if resolution == Resolution::Applied {
                    view.refresh_facets();
                }
                resolution
            }
            Err(e) => {
                record_failure(state, &ticket, &e);
                state.events.write().events.fail(seq, EVENTS_ERROR)
            }
        },

        Request::Scrape { source } => match state.api.scrape_events(source).await {
            Ok(result) => {
                let notice = format!(
                    "Successfully retrieved {} events ({} new, {} updated)",
                    result.events.len(),
                    result.counts.created,
                    result.counts.updated
                );
                info!(%source, notice = %notice, "scrape finished");
                let value = (!result.events.is_empty()).then_some(result.events);
                let mut view = state.events.write();
                let resolution = view.events.apply(seq, value, Some(notice));
                if resolution == Resolution::Applied {
                    view.refresh_facets();
                }
                resolution
            }
            Err(e) => {
                record_failure(state, &ticket, &e);
                state.events.write().events.fail(seq, SCRAPE_ERROR)
            }
        },
    };

    if resolution == Resolution::Discarded {
        debug!(
            view = ticket.view.as_str(),
            seq,
            request_id = %ticket.request_id,
            "stale response discarded"
        );
    }
    state.increment_version();
    resolution
}

// =============================================================================
// Entry points
// =============================================================================

/// Dispatch `action` and wait for its response to settle.
pub async fn run(state: &AppState, action: Action) -> Result<(Ticket, Resolution), DispatchError> {
    let prepared = prepare(state, action)?;
    let ticket = prepared.ticket.clone();
    let resolution = execute(state, prepared).await;
    Ok((ticket, resolution))
}

/// Dispatch `action` without waiting; the response settles in the background.
pub fn spawn(state: &Arc<AppState>, action: Action) -> Result<Ticket, DispatchError> {
    let prepared = prepare(state, action)?;
    let ticket = prepared.ticket.clone();
    let state = Arc::clone(state);
    tokio::spawn(async move {
        execute(&state, prepared).await;
    });
    Ok(ticket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Selection;
    use crate::test_support::{event_json, signal_set_json, state_for};
    use crate::types::EventImpact;
    use crate::views::slot::DataState;
    use axum::extract::{Query, RawQuery};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// `/signals` serves sets only for 2024-01-01 .. 2024-01-05.
    fn signals_router() -> Router {
        Router::new().route(
            "/signals",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let date = q.get("date").cloned().unwrap_or_else(|| "2024-01-05".to_string());
                let sets = if date.as_str() <= "2024-01-05" {
                    vec![signal_set_json(&date)]
                } else {
                    vec![]
                };
                Json(json!({ "status": "success", "count": sets.len(), "signals": sets }))
            }),
        )
    }

    /// `/events` filters a fixed table by the repeated query params.
    fn events_router() -> Router {
        Router::new().route(
            "/events",
            get(|RawQuery(q): RawQuery| async move {
                let all = vec![
                    event_json("US", "high", "cashbackforex"),
                    event_json("EU", "medium", "cashbackforex"),
                    event_json("JP", "low", "forexfactory"),
                ];
                let q = q.unwrap_or_default();
                let wanted: Vec<String> = q
                    .split('&')
                    .filter_map(|kv| kv.strip_prefix("impact=").map(str::to_string))
                    .collect();
                let data: Vec<_> = all
                    .into_iter()
                    .filter(|e| {
                        wanted.is_empty() || wanted.iter().any(|w| e["impact"] == w.as_str())
                    })
                    .collect();
                Json(json!({ "status": "success", "data": data }))
            }),
        )
    }

    #[tokio::test]
    async fn selecting_date_with_data_loads_it() {
        let state = state_for(signals_router(), d(2024, 1, 3)).await;
        let (_, resolution) = run(&state, Action::SelectDate(d(2024, 1, 2))).await.unwrap();
        assert_eq!(resolution, Resolution::Applied);
        let weekly = state.weekly.read();
        assert_eq!(weekly.signals.state(), DataState::Loaded);
        assert_eq!(weekly.signals.value().unwrap().date, d(2024, 1, 2));
        assert_eq!(weekly.selection.selected(), d(2024, 1, 2));
    }

    #[tokio::test]
    async fn selecting_date_without_data_is_empty_not_error() {
        let state = state_for(signals_router(), d(2024, 1, 3)).await;
        run(&state, Action::SelectDate(d(2024, 1, 6))).await.unwrap();
        let weekly = state.weekly.read();
        assert_eq!(weekly.signals.state(), DataState::Empty);
        assert_eq!(weekly.signals.error(), None);
        assert!(state.recent_errors.read().is_empty());
    }

    #[tokio::test]
    async fn selecting_date_in_other_week_reanchors() {
        let state = state_for(signals_router(), d(2024, 1, 3)).await;
        run(&state, Action::SelectDate(d(2023, 12, 28))).await.unwrap();
        let weekly = state.weekly.read();
        assert_eq!(weekly.selection.week().monday(), d(2023, 12, 25));
        assert!(weekly.selection.week().contains(d(2023, 12, 28)));
    }

    #[tokio::test]
    async fn week_day_selection_keeps_week() {
        let state = state_for(signals_router(), d(2024, 1, 3)).await;
        let (ticket, _) = run(&state, Action::SelectWeekDay(0)).await.unwrap();
        assert_eq!(ticket.view, ViewKind::Weekly);
        let weekly = state.weekly.read();
        assert_eq!(weekly.selection.selected(), d(2024, 1, 1));
        assert_eq!(weekly.selection.week().monday(), d(2024, 1, 1));
    }

    #[tokio::test]
    async fn invalid_week_day_is_rejected_without_dispatch() {
        let state = state_for(signals_router(), d(2024, 1, 3)).await;
        let err = run(&state, Action::SelectWeekDay(9)).await.unwrap_err();
        assert_eq!(err, DispatchError::InvalidWeekDay(9));
        assert!(!state.weekly.read().signals.is_loading());
    }

    #[tokio::test]
    async fn failure_keeps_previous_signals_and_logs() {
        let fail = Arc::new(AtomicU32::new(0));
        let flag = fail.clone();
        let router = Router::new().route(
            "/signals",
            get(move || {
                let flag = flag.clone();
                async move {
                    if flag.load(Ordering::SeqCst) == 0 {
                        Json(json!({
                            "status": "success",
                            "count": 1,
                            "signals": [signal_set_json("2024-01-02")]
                        }))
                        .into_response()
                    } else {
                        (StatusCode::INTERNAL_SERVER_ERROR, "down").into_response()
                    }
                }
            }),
        );
        let state = state_for(router, d(2024, 1, 3)).await;
        run(&state, Action::SelectDate(d(2024, 1, 2))).await.unwrap();
        fail.store(1, Ordering::SeqCst);
        run(&state, Action::SelectDate(d(2024, 1, 2))).await.unwrap();

        let weekly = state.weekly.read();
        assert_eq!(weekly.signals.error(), Some(WEEKLY_ERROR));
        assert_eq!(weekly.signals.value().unwrap().date, d(2024, 1, 2));
        let errors = state.recent_errors.read();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].view, "weekly");
        assert_eq!(errors[0].kind, "status");
    }

    #[tokio::test]
    async fn dashboard_flags_stale_set() {
        let state = state_for(signals_router(), d(2024, 1, 3)).await;
        run(&state, Action::RefreshDashboard).await.unwrap();
        let dashboard = state.dashboard.read();
        assert_eq!(dashboard.signals.value().unwrap().date, d(2024, 1, 5));
        // The mock always serves 2024-01-05, which is not the local date.
        assert!(dashboard.stale_warning.is_some());
    }

    #[tokio::test]
    async fn dashboard_malformed_response_is_error() {
        let router = Router::new().route(
            "/signals",
            get(|| async {
                Json(json!({ "status": "success", "signals": [{ "date": "not-a-date" }] }))
            }),
        );
        let state = state_for(router, d(2024, 1, 3)).await;
        run(&state, Action::RefreshDashboard).await.unwrap();
        let dashboard = state.dashboard.read();
        assert_eq!(dashboard.signals.error(), Some(DASHBOARD_ERROR));
        assert_eq!(dashboard.signals.state(), DataState::NotLoaded);
    }

    #[tokio::test]
    async fn impact_filter_then_reset_round_trips() {
        let state = state_for(events_router(), d(2024, 1, 3)).await;

        run(&state, Action::LoadEvents).await.unwrap();
        let original = state.events.read().events.value().cloned().unwrap();
        assert_eq!(original.len(), 3);

        run(&state, Action::ApplyFilter(FilterUpdate::Impact(Selection::Only(EventImpact::High))))
            .await
            .unwrap();
        {
            let view = state.events.read();
            let filtered = view.events.value().unwrap();
            assert_eq!(filtered.len(), 1);
            assert_eq!(filtered[0].impact, Some(EventImpact::High));
            assert!(view.filters.impact.is_some());
            // Facets come from the latest non-empty result.
            assert_eq!(view.facets.countries, vec!["US"]);
        }

        run(&state, Action::ResetFilters).await.unwrap();
        let view = state.events.read();
        assert!(view.filters.is_empty());
        assert_eq!(view.events.value().unwrap(), &original);
        assert_eq!(view.events.notice(), Some("Successfully loaded 3 events from database"));
    }

    #[tokio::test]
    async fn filter_sentinel_clears_dimension() {
        let state = state_for(events_router(), d(2024, 1, 3)).await;
        run(&state, Action::ApplyFilter(FilterUpdate::Impact(Selection::Only(EventImpact::Low))))
            .await
            .unwrap();
        run(&state, Action::ApplyFilter(FilterUpdate::Impact(Selection::All)))
            .await
            .unwrap();
        let view = state.events.read();
        assert!(view.filters.impact.is_none());
        assert_eq!(view.events.value().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn empty_event_list_is_empty_state() {
        let router = Router::new().route(
            "/events",
            get(|| async { Json(json!({ "status": "success", "data": [] })) }),
        );
        let state = state_for(router, d(2024, 1, 3)).await;
        run(&state, Action::LoadEvents).await.unwrap();
        let view = state.events.read();
        assert_eq!(view.events.state(), DataState::Empty);
        assert_eq!(view.events.error(), None);
    }

    #[tokio::test]
    async fn scrape_replaces_events_and_reports_counts() {
        let router = Router::new().route(
            "/scrape/cashbackforex",
            get(|| async {
                Json(json!({
                    "status": "success",
                    "data": [event_json("GB", "high", "cashbackforex")],
                    "db_result": { "created": 1, "updated": 4 }
                }))
            }),
        );
        let state = state_for(router, d(2024, 1, 3)).await;
        run(&state, Action::Scrape(None)).await.unwrap();
        let view = state.events.read();
        assert_eq!(view.events.value().unwrap().len(), 1);
        assert_eq!(
            view.events.notice(),
            Some("Successfully retrieved 1 events (1 new, 4 updated)")
        );
    }

    #[tokio::test]
    async fn scrape_envelope_error_keeps_events() {
        let router = events_router().route(
            "/scrape/cashbackforex",
            get(|| async { Json(json!({ "status": "error", "message": "Scraping failed" })) }),
        );
        let state = state_for(router, d(2024, 1, 3)).await;
        run(&state, Action::LoadEvents).await.unwrap();
        run(&state, Action::Scrape(Some(ScrapeSource::CashbackForex))).await.unwrap();
        let view = state.events.read();
        assert_eq!(view.events.error(), Some(SCRAPE_ERROR));
        assert_eq!(view.events.value().unwrap().len(), 3);
        assert_eq!(state.recent_errors.read()[0].kind, "envelope");
    }

    /// `/generate-signals` whose n-th call (0-based) sleeps `delays[n]` ms and
    /// answers with a set dated 2024-01-0{n+1}.
    fn generate_router(delays: &'static [u64]) -> Router {
        let calls = Arc::new(AtomicU32::new(0));
        Router::new().route(
            "/generate-signals",
            get(move || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) as usize;
                    tokio::time::sleep(Duration::from_millis(delays[n])).await;
                    let date = format!("2024-01-0{}", n + 1);
                    Json(json!({
                        "status": "success",
                        "message": "Signals generated and saved",
                        "db_result": { "success": true, "updated": false, "message": "ok" },
                        "signals": signal_set_json(&date)
                    }))
                }
            }),
        )
    }

    #[tokio::test]
    async fn rapid_generates_in_order_last_arrival_wins() {
        let state = state_for(generate_router(&[0, 150]), d(2024, 1, 3)).await;
        let first = spawn(&state, Action::GenerateSignals).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let second = spawn(&state, Action::GenerateSignals).unwrap();
        assert!(second.seq > first.seq);
        assert!(state.weekly.read().is_generating());

        tokio::time::sleep(Duration::from_millis(400)).await;
        let weekly = state.weekly.read();
        assert!(!weekly.is_generating());
        assert!(!weekly.signals.is_loading());
        assert_eq!(weekly.signals.value().unwrap().date, d(2024, 1, 2));
        assert_eq!(weekly.signals.status().seq, second.seq);
        assert_eq!(weekly.selection.selected(), d(2024, 1, 2));
    }

    #[tokio::test]
    async fn rapid_generates_out_of_order_older_is_discarded() {
        let state = state_for(generate_router(&[250, 0]), d(2024, 1, 3)).await;
        let first = state.clone();
        let slow = tokio::spawn(async move { run(&first, Action::GenerateSignals).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        let (_, fast) = run(&state, Action::GenerateSignals).await.unwrap();
        assert_eq!(fast, Resolution::Applied);

        let (_, late) = slow.await.unwrap().unwrap();
        assert_eq!(late, Resolution::Discarded);
        let weekly = state.weekly.read();
        assert_eq!(weekly.signals.value().unwrap().date, d(2024, 1, 2));
        assert!(!weekly.is_generating());
    }
}
