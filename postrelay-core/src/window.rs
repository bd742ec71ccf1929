//! Calendar-day windows in a fixed UTC offset.
//!
//! Two clocks are in play: the primary query is bounded by UTC calendar days
//! (`QueryDateRange`), while the keyword guard accepts only posts made
//! during the current local day in a fixed offset (`day_window`, `in_window`).

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

/// Offset used by the keyword window guard (UTC+9).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

/// Half-open `[start, end)` interval of absolute instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Inclusive `since` / exclusive `until` calendar dates for the primary query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDateRange {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl QueryDateRange {
    /// Today through tomorrow, both taken from the UTC calendar.
    pub fn utc_today(reference: DateTime<Utc>) -> Self {
        Self {
            since: reference.date_naive(),
            until: (reference + Duration::days(1)).date_naive(),
        }
    }
}

fn fixed_offset(offset_hours: i32) -> FixedOffset {
    // Offsets are validated to -23..=23 at config load; clamp keeps this total.
    let seconds = offset_hours.clamp(-23, 23) * 3600;
    FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix())
}

/// The local calendar day containing `reference`, shifted by `offset_hours`,
/// mapped back to absolute instants.
pub fn day_window(reference: DateTime<Utc>, offset_hours: i32) -> DayWindow {
    let offset = fixed_offset(offset_hours);
    let local_midnight = reference
        .with_timezone(&offset)
        .date_naive()
        .and_time(NaiveTime::MIN);
    // A fixed offset has no gaps or folds, so the local midnight is unique.
    let start = (local_midnight - Duration::seconds(i64::from(offset.local_minus_utc())))
        .and_utc();
    DayWindow {
        start,
        end: start + Duration::hours(24),
    }
}

/// Whether an ISO-8601 timestamp falls within the local day of `reference`.
/// Absent or unparseable timestamps are never in the window.
pub fn in_window(timestamp: Option<&str>, reference: DateTime<Utc>, offset_hours: i32) -> bool {
    let Some(instant) = timestamp.and_then(parse_timestamp) else {
        return false;
    };
    day_window(reference, offset_hours).contains(instant)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
