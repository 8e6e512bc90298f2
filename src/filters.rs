// =============================================================================
// Filter Criteria — partial constraints on the economic events list
// =============================================================================
//
// A missing dimension means "no constraint". The UI exposes single-select
// controls, so merging a concrete value replaces that dimension with a
// one-element set, and the "all" sentinel removes the dimension entirely.
//
// Merging never mutates the input; the caller decides when to re-fetch.
// =============================================================================

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{EconomicEvent, EventImpact};

/// Sentinel value the UI sends to clear a dimension.
pub const ALL_SENTINEL: &str = "all";

/// Partial constraint set narrowing the event list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countries: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<BTreeSet<EventImpact>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<BTreeSet<String>>,
}

/// Either the "no constraint" sentinel or one concrete value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Selection<T> {
    fn into_set(self) -> Option<BTreeSet<T>>
    where
        T: Ord,
    {
        match self {
            Self::All => None,
            Self::Only(value) => Some(BTreeSet::from([value])),
        }
    }
}

/// Dimensions that can be changed through a single-select control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterDimension {
    Country,
    Impact,
    Source,
}

/// One change to apply to a [`FilterCriteria`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    Country(Selection<String>),
    Impact(Selection<EventImpact>),
    Source(Selection<String>),
    StartDate(Option<NaiveDate>),
    EndDate(Option<NaiveDate>),
}

impl FilterUpdate {
    /// Build an update from a dropdown change; `"all"` (any casing) clears.
    pub fn from_select(dimension: FilterDimension, value: &str) -> Result<Self, String> {
        let value = value.trim();
        if value.is_empty() {
            return Err(format!("empty value for {dimension:?} filter"));
        }
        let clear = value.eq_ignore_ascii_case(ALL_SENTINEL);
        let update = match dimension {
            FilterDimension::Country if clear => Self::Country(Selection::All),
            FilterDimension::Country => Self::Country(Selection::Only(value.to_string())),
            FilterDimension::Source if clear => Self::Source(Selection::All),
            FilterDimension::Source => Self::Source(Selection::Only(value.to_string())),
            FilterDimension::Impact if clear => Self::Impact(Selection::All),
            FilterDimension::Impact => Self::Impact(Selection::Only(value.parse()?)),
        };
        Ok(update)
    }
}

impl FilterCriteria {
    /// Return a copy of `self` with `update` applied.
    pub fn merged(&self, update: FilterUpdate) -> FilterCriteria {
        let mut next = self.clone();
        match update {
            FilterUpdate::Country(sel) => next.countries = sel.into_set(),
            FilterUpdate::Impact(sel) => next.impact = sel.into_set(),
            FilterUpdate::Source(sel) => next.sources = sel.into_set(),
            FilterUpdate::StartDate(date) => next.start_date = date,
            FilterUpdate::EndDate(date) => next.end_date = date,
        }
        next
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Canonical query for `GET /events`. Set-valued dimensions repeat the key
    /// once per value, in sorted order. Empty criteria yield no pairs.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(date) = self.start_date {
            pairs.push(("start_date", date.format("%Y-%m-%d").to_string()));
        }
        if let Some(date) = self.end_date {
            pairs.push(("end_date", date.format("%Y-%m-%d").to_string()));
        }
        for country in self.countries.iter().flatten() {
            pairs.push(("countries", country.clone()));
        }
        for impact in self.impact.iter().flatten() {
            pairs.push(("impact", impact.as_str().to_string()));
        }
        for source in self.sources.iter().flatten() {
            pairs.push(("sources", source.clone()));
        }
        pairs
    }
}

/// Unique, sorted values offered by the country and source dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterFacets {
    pub countries: Vec<String>,
    pub sources: Vec<String>,
}

impl FilterFacets {
    pub fn from_events(events: &[EconomicEvent]) -> Self {
        let countries: BTreeSet<&str> = events.iter().map(|e| e.country.as_str()).collect();
        let sources: BTreeSet<&str> = events.iter().map(|e| e.source.as_str()).collect();
        Self {
            countries: countries.into_iter().map(str::to_string).collect(),
            sources: sources.into_iter().map(str::to_string).collect(),
        }
    }
}
