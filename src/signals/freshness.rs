// =============================================================================
// Signal Freshness — is the displayed signal set from today?
// =============================================================================

use chrono::{DateTime, NaiveDate, Utc};

/// A set is stale when its date differs from `today`.
///
/// `today` is supplied by the caller so the check stays independent of the
/// process clock and timezone.
pub fn is_stale(set_date: NaiveDate, today: NaiveDate) -> bool {
    set_date != today
}

/// Human-readable warning for a stale set, `None` when fresh.
pub fn stale_warning(set_date: NaiveDate, today: NaiveDate) -> Option<String> {
    is_stale(set_date, today).then(|| {
        format!(
            "Signals are from {} and may be outdated (today is {}).",
            set_date.format("%Y-%m-%d"),
            today.format("%Y-%m-%d")
        )
    })
}

/// "Last updated" label, e.g. `Jan 1, 2024, 09:30 AM`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%b %-d, %Y, %I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn previous_day_is_stale() {
        assert!(is_stale(d(2024, 1, 1), d(2024, 1, 2)));
    }

    #[test]
    fn same_day_is_fresh() {
        assert!(!is_stale(d(2024, 1, 1), d(2024, 1, 1)));
        assert_eq!(stale_warning(d(2024, 1, 1), d(2024, 1, 1)), None);
    }

    #[test]
    fn future_set_is_also_stale() {
        assert!(is_stale(d(2024, 1, 3), d(2024, 1, 2)));
    }

    #[test]
    fn warning_names_both_dates() {
        let msg = stale_warning(d(2024, 1, 1), d(2024, 1, 2)).unwrap();
        assert!(msg.contains("2024-01-01"));
        assert!(msg.contains("2024-01-02"));
    }

    #[test]
    fn timestamp_label() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 21, 5, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "Jan 1, 2024, 09:05 PM");
    }
}
