// =============================================================================
// Weekly View — week selector, signal set of the selected day, generation
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::SignalSet;
use crate::views::slot::{SlotStatus, ViewSlot};
use crate::week::{WeekDay, WeekSelection};

#[derive(Debug)]
pub struct WeeklyView {
    pub selection: WeekSelection,
    /// Written by both date fetches and generation; the newest dispatch wins.
    pub signals: ViewSlot<SignalSet>,
    generating: u32,
}

impl WeeklyView {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            selection: WeekSelection::new(today),
            signals: ViewSlot::new(),
            generating: 0,
        }
    }

    pub fn is_generating(&self) -> bool {
        self.generating > 0
    }

    pub fn start_generating(&mut self) {
        self.generating += 1;
    }

    pub fn finish_generating(&mut self) {
        self.generating = self.generating.saturating_sub(1);
    }

    pub fn snapshot(&self) -> WeeklySnapshot {
        WeeklySnapshot {
            status: self.signals.status(),
            selected_date: self.selection.selected(),
            week: self.selection.week().labelled(),
            generating: self.is_generating(),
            signal_set: self.signals.value().cloned(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklySnapshot {
    #[serde(flatten)]
    pub status: SlotStatus,
    pub selected_date: NaiveDate,
    pub week: Vec<WeekDay>,
    pub generating: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_set: Option<SignalSet>,
}
