//! SQLite helper utilities for type conversion
//!
//! SQLite has no native timestamp type. Timestamps are stored as RFC 3339
//! TEXT in UTC with a fixed millisecond precision so that lexicographic
//! comparison in SQL matches chronological order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

// ============================================================================
// Timestamp Helpers
// ============================================================================

/// Get current UTC timestamp in the stored TEXT format
#[inline]
pub fn now_iso8601() -> String {
    datetime_to_str(Utc::now())
}

/// Convert a chrono DateTime to the stored TEXT format
#[inline]
pub fn datetime_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339, SQLite's `datetime('now')` layout and bare dates
/// (midnight UTC).
pub fn str_to_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for layout in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Decode a required timestamp column, failing the row on bad data
pub fn decode_datetime(column: &str, s: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    str_to_datetime(s).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("invalid timestamp '{}'", s).into(),
    })
}

/// Decode an optional timestamp column
pub fn decode_datetime_opt(
    column: &str,
    s: Option<String>,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    s.map(|s| decode_datetime(column, &s)).transpose()
}

// ============================================================================
// Search Helpers
// ============================================================================

/// Fold text for case-insensitive search.
///
/// SQLite's `LOWER()` only folds ASCII, so searchable columns keep a copy
/// folded here and search needles go through the same function.
#[inline]
pub fn fold_case(s: &str) -> String {
    s.to_lowercase()
}
