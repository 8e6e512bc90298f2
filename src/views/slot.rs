// =============================================================================
// View Slot — data / loading / error state of one view, with stale-response
// guarding
// =============================================================================
//
// Every dispatch into a slot takes the next sequence number. When a response
// settles, it is applied only if it is newer than the newest response already
// settled in the slot; anything older is discarded. Overlapping requests
// therefore always run to completion, but the newest dispatch wins even when
// responses arrive out of order.
//
// A successful response replaces the data wholesale. A failed one keeps the
// previous data and records a human-readable message. "No data" is its own
// state and never shows up as an error.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What the slot currently displays.
#[derive(Debug, Clone, PartialEq)]
enum ViewData<T> {
    NotLoaded,
    Empty,
    Loaded(T),
}

/// Serialisable tag of [`ViewData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataState {
    NotLoaded,
    Empty,
    Loaded,
}

/// Whether a settled response changed the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Applied,
    Discarded,
}

/// Status half of a slot, shared by every view snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotStatus {
    pub state: DataState,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    /// Sequence number of the response currently displayed (0 = none yet).
    pub seq: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ViewSlot<T> {
    data: ViewData<T>,
    error: Option<String>,
    notice: Option<String>,
    dispatched_seq: u64,
    settled_seq: u64,
    updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for ViewSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ViewSlot<T> {
    pub fn new() -> Self {
        Self {
            data: ViewData::NotLoaded,
            error: None,
            notice: None,
            dispatched_seq: 0,
            settled_seq: 0,
            updated_at: None,
        }
    }

    /// Register a new request and return its sequence number. Clears the
    /// previous error so a retry starts clean.
    pub fn begin(&mut self) -> u64 {
        self.dispatched_seq += 1;
        self.error = None;
        self.dispatched_seq
    }

    /// Loading while the newest dispatch has not settled.
    pub fn is_loading(&self) -> bool {
        self.settled_seq < self.dispatched_seq
    }

    fn settle(&mut self, seq: u64) -> bool {
        if seq <= self.settled_seq || seq > self.dispatched_seq {
            return false;
        }
        self.settled_seq = seq;
        self.updated_at = Some(Utc::now());
        true
    }

    /// Settle `seq` with a successful result; `None` is the explicit empty
    /// state.
    pub fn apply(&mut self, seq: u64, value: Option<T>, notice: Option<String>) -> Resolution {
        if !self.settle(seq) {
            return Resolution::Discarded;
        }
        self.data = match value {
            Some(v) => ViewData::Loaded(v),
            None => ViewData::Empty,
        };
        self.error = None;
        self.notice = notice;
        Resolution::Applied
    }

    /// Settle `seq` with a failure. Previously displayed data is kept.
    pub fn fail(&mut self, seq: u64, message: impl Into<String>) -> Resolution {
        if !self.settle(seq) {
            return Resolution::Discarded;
        }
        self.error = Some(message.into());
        self.notice = None;
        Resolution::Applied
    }

    pub fn value(&self) -> Option<&T> {
        match &self.data {
            ViewData::Loaded(v) => Some(v),
            _ => None,
        }
    }

    pub fn state(&self) -> DataState {
        match self.data {
            ViewData::NotLoaded => DataState::NotLoaded,
            ViewData::Empty => DataState::Empty,
            ViewData::Loaded(_) => DataState::Loaded,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn status(&self) -> SlotStatus {
        SlotStatus {
            state: self.state(),
            loading: self.is_loading(),
            error: self.error.clone(),
            notice: self.notice.clone(),
            seq: self.settled_seq,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_slot_is_idle_and_not_loaded() {
        let slot: ViewSlot<u32> = ViewSlot::new();
        assert_eq!(slot.state(), DataState::NotLoaded);
        assert!(!slot.is_loading());
    }

    #[test]
    fn success_replaces_wholesale() {
        let mut slot = ViewSlot::new();
        let s1 = slot.begin();
        assert!(slot.is_loading());
        assert_eq!(slot.apply(s1, Some(vec![1, 2, 3]), None), Resolution::Applied);
        let s2 = slot.begin();
        slot.apply(s2, Some(vec![9]), Some("ok".into()));
        assert_eq!(slot.value(), Some(&vec![9]));
        assert_eq!(slot.notice(), Some("ok"));
        assert!(!slot.is_loading());
    }

    #[test]
    fn failure_preserves_previous_data() {
        let mut slot = ViewSlot::new();
        let s1 = slot.begin();
        slot.apply(s1, Some("good"), None);
        let s2 = slot.begin();
        slot.fail(s2, "Failed to load");
        assert_eq!(slot.value(), Some(&"good"));
        assert_eq!(slot.error(), Some("Failed to load"));
        assert_eq!(slot.state(), DataState::Loaded);
    }

    #[test]
    fn empty_is_distinct_from_error() {
        let mut slot: ViewSlot<u8> = ViewSlot::new();
        let s = slot.begin();
        slot.apply(s, None, None);
        assert_eq!(slot.state(), DataState::Empty);
        assert_eq!(slot.error(), None);
    }

    #[test]
    fn in_order_responses_last_one_wins() {
        let mut slot = ViewSlot::new();
        let s1 = slot.begin();
        let s2 = slot.begin();
        assert_eq!(slot.apply(s1, Some("first"), None), Resolution::Applied);
        assert!(slot.is_loading());
        assert_eq!(slot.apply(s2, Some("second"), None), Resolution::Applied);
        assert_eq!(slot.value(), Some(&"second"));
        assert!(!slot.is_loading());
    }

    #[test]
    fn out_of_order_older_response_is_discarded() {
        let mut slot = ViewSlot::new();
        let s1 = slot.begin();
        let s2 = slot.begin();
        assert_eq!(slot.apply(s2, Some("newer"), None), Resolution::Applied);
        assert!(!slot.is_loading());
        assert_eq!(slot.apply(s1, Some("older"), None), Resolution::Discarded);
        assert_eq!(slot.fail(s1, "late failure"), Resolution::Discarded);
        assert_eq!(slot.value(), Some(&"newer"));
        assert_eq!(slot.error(), None);
        assert_eq!(slot.status().seq, s2);
    }

    #[test]
    fn unknown_sequence_is_discarded() {
        let mut slot: ViewSlot<u8> = ViewSlot::new();
        assert_eq!(slot.apply(5, Some(1), None), Resolution::Discarded);
        assert_eq!(slot.state(), DataState::NotLoaded);
    }

    #[test]
    fn begin_clears_error() {
        let mut slot: ViewSlot<u8> = ViewSlot::new();
        let s = slot.begin();
        slot.fail(s, "boom");
        slot.begin();
        assert_eq!(slot.error(), None);
        assert!(slot.status().loading);
    }
}
