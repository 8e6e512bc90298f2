// =============================================================================
// Week Range Calculator — Monday-start week bucketing for the weekly view
// =============================================================================
//
// The weekly view shows one button per day of the week containing the
// selected date. `WeekSelection` keeps the selected date and the displayed
// week consistent: picking a date from the calendar re-anchors the week,
// picking one of the seven buttons only moves the selection.
// =============================================================================

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

/// Number of days in a displayed week.
pub const DAYS_IN_WEEK: usize = 7;

/// Seven consecutive calendar dates, Monday through Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WeekDates([NaiveDate; DAYS_IN_WEEK]);

impl WeekDates {
    pub fn monday(&self) -> NaiveDate {
        self.0[0]
    }

    pub fn sunday(&self) -> NaiveDate {
        self.0[DAYS_IN_WEEK - 1]
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.monday() && date <= self.sunday()
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[NaiveDate] {
        &self.0
    }

    /// Short weekday labels paired with their dates, for the week selector.
    pub fn labelled(&self) -> Vec<WeekDay> {
        self.iter()
            .map(|date| WeekDay {
                date,
                label: date.format("%a").to_string(),
            })
            .collect()
    }
}

/// One entry of the week selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub label: String,
}

/// Compute the Monday-start week containing `reference`.
///
/// Only the calendar date matters; callers convert instants to dates in
/// whatever timezone they display.
pub fn week_dates(reference: NaiveDate) -> WeekDates {
    let offset = u64::from(reference.weekday().num_days_from_monday());
    let monday = reference
        .checked_sub_days(Days::new(offset))
        .unwrap_or(NaiveDate::MIN);

    let mut dates = [monday; DAYS_IN_WEEK];
    for (i, slot) in dates.iter_mut().enumerate() {
        *slot = monday
            .checked_add_days(Days::new(i as u64))
            .unwrap_or(NaiveDate::MAX);
    }
    WeekDates(dates)
}

/// Selected date plus the week that is currently displayed around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekSelection {
    selected: NaiveDate,
    week: WeekDates,
}

impl WeekSelection {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            selected: date,
            week: week_dates(date),
        }
    }

    pub fn selected(&self) -> NaiveDate {
        self.selected
    }

    pub fn week(&self) -> &WeekDates {
        &self.week
    }

    /// Select an arbitrary date (calendar picker). The week is re-anchored
    /// only when the date falls outside the displayed one.
    pub fn select(&mut self, date: NaiveDate) {
        self.selected = date;
        if !self.week.contains(date) {
            self.week = week_dates(date);
        }
    }

    /// Select the `index`-th day of the displayed week (0 = Monday).
    /// Returns the newly selected date, or `None` if out of range.
    pub fn select_day(&mut self, index: usize) -> Option<NaiveDate> {
        let date = *self.week.as_slice().get(index)?;
        self.selected = date;
        Some(date)
    }
}
