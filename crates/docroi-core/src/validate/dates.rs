//! Date normalization for validated fields.

use chrono::NaiveDate;

/// Source format of dates printed on documents.
const SOURCE_FORMAT: &str = "%d/%m/%Y";

/// ISO 8601 calendar date.
const TARGET_FORMAT: &str = "%Y-%m-%d";

/// Parse a `DD/MM/YYYY` date.
///
/// Returns `None` for any other layout or for dates that do not exist on
/// the calendar (e.g. `31/02/2024`).
pub fn parse_dmy(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), SOURCE_FORMAT).ok()
}

/// Reformat a `DD/MM/YYYY` date as `YYYY-MM-DD`.
pub fn reformat_date(text: &str) -> Option<String> {
    parse_dmy(text).map(|date| date.format(TARGET_FORMAT).to_string())
}
