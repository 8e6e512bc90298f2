// =============================================================================
// Signals Module
// =============================================================================
//
// Read-side helpers over a received SignalSet:
// - Freshness check against a caller-supplied "today"
// - Direction tabs, per-tab counts and free-text search for the dashboard

pub mod freshness;
pub mod tabs;

pub use freshness::{format_timestamp, stale_warning};
pub use tabs::{filter_signals, SignalTab, TabCounts};
