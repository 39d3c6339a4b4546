//! Lenient date parsing and the long-form date rendering used in digests.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%A, %B %d, %Y"];

/// Parse a date or date-time string into local wall-clock time.
///
/// Values carrying an explicit offset keep the wall-clock time of that offset;
/// use [`parse_in_zone`] to move them into a specific zone.
#[must_use]
pub fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Parse a timestamp and express it as wall-clock time in `tz`.
///
/// Offset-bearing values (e.g. `2024-06-11T07:00:00Z`) are converted; values
/// without an offset are taken to already be in `tz`.
#[must_use]
pub fn parse_in_zone(raw: &str, tz: Tz) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&tz).naive_local());
    }
    parse_naive(trimmed)
}

/// Whether `raw` carries an explicit UTC offset.
#[must_use]
pub fn has_offset(raw: &str) -> bool {
    DateTime::parse_from_rfc3339(raw.trim()).is_ok()
}

/// Today's date in `tz`.
#[must_use]
pub fn today_in(tz: Tz) -> NaiveDate {
    chrono::Utc::now().with_timezone(&tz).date_naive()
}

/// Long date such as `Wednesday, June 12, 2024`.
#[must_use]
pub fn long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}
