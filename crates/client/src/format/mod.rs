//! Pure display formatters. None of these fail; missing input yields an
//! empty or default label.

mod names;
mod numbers;
mod time;

pub use names::{full_name, initials, split_full_name};
pub use numbers::abbreviate_count;
pub use time::{day_label, group_by_day, relative_time, DayGroup, DAY_COUNT_LIMIT_DAYS};
