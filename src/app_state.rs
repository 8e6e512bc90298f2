// =============================================================================
// Central Application State — Signal Desk
// =============================================================================
//
// Ties the per-view state slots, the health indicator, the error log and the
// remote client together, and builds the unified snapshot served by the
// REST API and the WebSocket feed.
//
// Thread safety:
//   - Atomic counters for lock-free version tracking.
//   - parking_lot::RwLock per view; a lock is never held across an `.await`.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::health::{HealthSnapshot, HealthState};
use crate::remote::{ApiClient, FetchError};
use crate::runtime_config::RuntimeConfig;
use crate::views::{
    DashboardSnapshot, DashboardView, EventsSnapshot, EventsView, WeeklySnapshot, WeeklyView,
};

// =============================================================================
// Error Record
// =============================================================================

/// A recorded fetch failure for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Which view the failed request belonged to.
    pub view: String,
    /// Full error text (the view itself only shows a generic message).
    pub message: String,
    /// Error kind: transport, status, envelope or decode.
    pub kind: String,
    /// Id of the dispatch that failed.
    pub request_id: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

// =============================================================================
// AppState
// =============================================================================

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Incremented on every meaningful state mutation. The WebSocket feed
    /// uses this to detect changes and push updates.
    pub state_version: AtomicU64,

    /// WebSocket message sequence number (incremented per message sent).
    pub ws_sequence_number: AtomicU64,

    /// Currently connected WebSocket clients.
    pub ws_clients: AtomicU64,

    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    // ── Remote API ──────────────────────────────────────────────────────
    pub api: ApiClient,

    // ── Views ───────────────────────────────────────────────────────────
    pub dashboard: RwLock<DashboardView>,
    pub weekly: RwLock<WeeklyView>,
    pub events: RwLock<EventsView>,

    // ── Server status indicator ─────────────────────────────────────────
    pub health: RwLock<HealthState>,

    // ── Error Log ───────────────────────────────────────────────────────
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    // ── Timing ──────────────────────────────────────────────────────────
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Build the state with every view empty; the weekly view starts on the
    /// week containing `today`.
    pub fn new(config: RuntimeConfig, api: ApiClient, today: NaiveDate) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            ws_sequence_number: AtomicU64::new(0),
            ws_clients: AtomicU64::new(0),

            runtime_config: Arc::new(RwLock::new(config)),
            api,

            dashboard: RwLock::new(DashboardView::default()),
            weekly: RwLock::new(WeeklyView::new(today)),
            events: RwLock::new(EventsView::default()),

            health: RwLock::new(HealthState::default()),
            recent_errors: RwLock::new(Vec::new()),

            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Read the current state version without modifying it.
    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record a fetch failure. The log is capped at [`MAX_RECENT_ERRORS`];
    /// oldest entries are evicted first.
    pub fn push_error(&self, view: &str, err: &FetchError, request_id: &str) {
        let record = ErrorRecord {
            view: view.to_string(),
            message: err.to_string(),
            kind: err.kind().to_string(),
            request_id: request_id.to_string(),
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        drop(errors);

        self.increment_version();
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Build a complete, serialisable snapshot of every view.
    pub fn build_snapshot(&self) -> StateSnapshot {
        let config = self.runtime_config.read();

        StateSnapshot {
            state_version: self.current_state_version(),
            server_time: Utc::now().timestamp_millis(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            ws_clients: self.ws_clients.load(Ordering::SeqCst),
            ws_sequence_number: self.ws_sequence_number.load(Ordering::SeqCst),
            health: self.health.read().snapshot(),
            dashboard: self.dashboard.read().snapshot(),
            weekly: self.weekly.read().snapshot(),
            events: self.events.read().snapshot(),
            recent_errors: self.recent_errors.read().clone(),
            config: ConfigSummary {
                api_base_url: config.api_base_url.clone(),
                health_interval_secs: config.health_interval_secs,
            },
        }
    }
}

// =============================================================================
// Serialisable snapshot types
// =============================================================================

/// Full state snapshot sent to the front end.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub uptime_secs: u64,
    /// Currently connected WebSocket clients.
    pub ws_clients: u64,
    /// Snapshots pushed over WebSocket since startup.
    pub ws_sequence_number: u64,
    pub health: HealthSnapshot,
    pub dashboard: DashboardSnapshot,
    pub weekly: WeeklySnapshot,
    pub events: EventsSnapshot,
    pub recent_errors: Vec<ErrorRecord>,
    pub config: ConfigSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub api_base_url: String,
    pub health_interval_secs: u64,
}
