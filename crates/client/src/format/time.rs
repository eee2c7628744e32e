//! Relative-time labels and day grouping.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Past this age a timestamp is shown as a calendar date instead of a count.
pub const DAY_COUNT_LIMIT_DAYS: i64 = 7;

/// Short label for how long ago `then` was: `"30s"`, `"5m"`, `"3h"`, `"2d"`,
/// then `"Oct 8"` (or `"Oct 8, 2025"` in another year).
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - then).max(Duration::zero());

    if elapsed < Duration::minutes(1) {
        format!("{}s", elapsed.num_seconds())
    } else if elapsed < Duration::hours(1) {
        format!("{}m", elapsed.num_minutes())
    } else if elapsed < Duration::days(1) {
        format!("{}h", elapsed.num_hours())
    } else if elapsed < Duration::days(DAY_COUNT_LIMIT_DAYS) {
        format!("{}d", elapsed.num_days())
    } else if then.year() == now.year() {
        then.format("%b %-d").to_string()
    } else {
        then.format("%b %-d, %Y").to_string()
    }
}

/// Heading for a calendar day: `"Today"`, `"Yesterday"` or `"October 8, 2026"`.
pub fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    if day == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(day) {
        "Yesterday".to_string()
    } else {
        day.format("%B %-d, %Y").to_string()
    }
}

/// Items sharing one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup<T> {
    pub day: NaiveDate,
    pub label: String,
    pub items: Vec<T>,
}

/// Group consecutive items by UTC calendar day, keeping input order.
///
/// Items are expected sorted by time; an out-of-order item starts a new
/// group rather than being merged back.
pub fn group_by_day<T, F>(items: Vec<T>, timestamp_of: F, now: DateTime<Utc>) -> Vec<DayGroup<T>>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    let today = now.date_naive();
    let mut groups: Vec<DayGroup<T>> = Vec::new();

    for item in items {
        let day = timestamp_of(&item).date_naive();
        match groups.last_mut() {
            Some(group) if group.day == day => group.items.push(item),
            _ => groups.push(DayGroup {
                day,
                label: day_label(day, today),
                items: vec![item],
            }),
        }
    }

    groups
}
