// =============================================================================
// Events View — economic calendar table with filters
// =============================================================================

use serde::Serialize;

use crate::filters::{FilterCriteria, FilterFacets};
use crate::types::EconomicEvent;
use crate::views::slot::{SlotStatus, ViewSlot};

#[derive(Debug, Default)]
pub struct EventsView {
    pub filters: FilterCriteria,
    pub events: ViewSlot<Vec<EconomicEvent>>,
    /// Dropdown options; refreshed only from non-empty results so that a
    /// narrow filter does not shrink the choices.
    pub facets: FilterFacets,
}

impl EventsView {
    pub fn refresh_facets(&mut self) {
        if let Some(events) = self.events.value() {
            if !events.is_empty() {
                self.facets = FilterFacets::from_events(events);
            }
        }
    }

    pub fn snapshot(&self) -> EventsSnapshot {
        EventsSnapshot {
            status: self.events.status(),
            filters: self.filters.clone(),
            facets: self.facets.clone(),
            events: self.events.value().cloned().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventsSnapshot {
    #[serde(flatten)]
    pub status: SlotStatus,
    pub filters: FilterCriteria,
    pub facets: FilterFacets,
    pub events: Vec<EconomicEvent>,
}
