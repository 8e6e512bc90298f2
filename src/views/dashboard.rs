// =============================================================================
// Dashboard View — current signal set with direction tabs and search
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::signals::{filter_signals, format_timestamp, SignalTab, TabCounts};
use crate::types::{Signal, SignalSet};
use crate::views::slot::{SlotStatus, ViewSlot};

#[derive(Debug, Default)]
pub struct DashboardView {
    pub signals: ViewSlot<SignalSet>,
    pub search: String,
    pub tab: SignalTab,
    /// Set when the displayed set is not from today.
    pub stale_warning: Option<String>,
}

/// Dashboard payload for the front end.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    #[serde(flatten)]
    pub status: SlotStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_warning: Option<String>,
    pub tab: SignalTab,
    pub search: String,
    pub counts: TabCounts,
    pub signals: Vec<Signal>,
}

impl DashboardView {
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot_with(self.tab, &self.search)
    }

    /// Snapshot under an ad-hoc tab / search, leaving the stored ones alone.
    pub fn snapshot_with(&self, tab: SignalTab, search: &str) -> DashboardSnapshot {
        let set = self.signals.value();
        let (visible, counts) = match set {
            Some(set) => {
                let (visible, counts) = filter_signals(&set.signals, search, tab);
                (visible.into_iter().cloned().collect(), counts)
            }
            None => (Vec::new(), TabCounts::default()),
        };

        DashboardSnapshot {
            status: self.signals.status(),
            date: set.map(|s| s.date),
            last_updated: set.map(|s| format_timestamp(&s.timestamp)),
            market_summary: set.map(|s| s.market_summary.clone()),
            stale_warning: self.stale_warning.clone(),
            tab,
            search: search.to_string(),
            counts,
            signals: visible,
        }
    }
}
