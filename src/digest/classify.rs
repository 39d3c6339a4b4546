//! Due-date classification of list items into per-recipient urgency buckets.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use tracing::debug;

use crate::core::models::{Bucket, FieldValue, ListItem, RecipientDigest};
use crate::utils::dates::parse_naive;

/// Field names and thresholds the classifier reads items with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierSettings {
    /// Items whose `filter_field` equals `filter_value` are skipped (e.g. completed tasks).
    pub filter_field: String,
    pub filter_value: String,
    pub due_date_field: String,
    pub modified_field: String,
    /// Overdue items not touched for this many days before their due date are "way overdue".
    pub way_overdue_delta_days: i64,
}

/// Last day of the Sunday-to-Saturday week containing `today`.
#[must_use]
pub fn end_of_week(today: NaiveDate) -> NaiveDate {
    let ordinal = i64::from(today.weekday().num_days_from_sunday());
    today + TimeDelta::days(6 - ordinal)
}

fn field_datetime(item: &ListItem, name: &str) -> Option<NaiveDateTime> {
    match item.get(name)? {
        FieldValue::Date(dt) => Some(*dt),
        other => parse_naive(&other.raw()),
    }
}

/// Bucket for a due date, or `None` when it falls after the current week.
#[must_use]
pub fn bucket_for_dates(
    due: NaiveDateTime,
    modified: Option<NaiveDateTime>,
    today: NaiveDate,
    way_overdue_delta_days: i64,
) -> Option<Bucket> {
    let due_date = due.date();

    if due_date == today {
        return Some(Bucket::Today);
    }

    if due_date < today {
        // An out-of-range delta leaves no threshold, so the item stays plain overdue
        let threshold = TimeDelta::try_days(way_overdue_delta_days)
            .and_then(|delta| due.checked_sub_signed(delta));
        let way_overdue = matches!((modified, threshold), (Some(m), Some(t)) if m < t);
        return Some(if way_overdue {
            Bucket::WayOverdue
        } else {
            Bucket::Overdue
        });
    }

    if Some(due_date) == today.succ_opt() {
        return Some(Bucket::Tomorrow);
    }

    if due_date <= end_of_week(today) {
        return Some(Bucket::ThisWeek);
    }

    None
}

/// Bucket for one item, ignoring who it belongs to.
///
/// Returns `None` for filtered items, unparsable due dates and due dates past
/// the end of the week.
#[must_use]
pub fn classify_item(
    item: &ListItem,
    settings: &ClassifierSettings,
    today: NaiveDate,
) -> Option<Bucket> {
    if is_filtered(item, settings) {
        return None;
    }
    let due = field_datetime(item, &settings.due_date_field)?;
    let modified = field_datetime(item, &settings.modified_field);
    bucket_for_dates(due, modified, today, settings.way_overdue_delta_days)
}

/// Whether the item matches the exclusion filter (missing fields read as empty).
#[must_use]
pub fn is_filtered(item: &ListItem, settings: &ClassifierSettings) -> bool {
    item.raw(&settings.filter_field) == settings.filter_value.as_str()
}

/// Group `items` by recipient and urgency.
///
/// A recipient gets an (initially empty) bucket set as soon as one of their
/// items has a parsable due date, even when that item lands in no bucket.
pub fn classify<F>(
    items: &[ListItem],
    mut resolve_recipient: F,
    settings: &ClassifierSettings,
    today: NaiveDate,
) -> RecipientDigest
where
    F: FnMut(&ListItem) -> Option<String>,
{
    let mut digest = RecipientDigest::new();

    for item in items {
        if is_filtered(item, settings) {
            debug!("Skipping item {}: matches filter", item.id);
            continue;
        }

        let email = resolve_recipient(item).filter(|e| !e.trim().is_empty());
        let due = field_datetime(item, &settings.due_date_field);
        let (Some(email), Some(due)) = (email, due) else {
            debug!("Skipping item {}: no recipient or due date", item.id);
            continue;
        };

        let modified = field_datetime(item, &settings.modified_field);
        let buckets = digest.entry(&email);
        match bucket_for_dates(due, modified, today, settings.way_overdue_delta_days) {
            Some(bucket) => buckets.push(bucket, item.clone()),
            None => debug!("Item {} for {} is not due this week", item.id, email),
        }
    }

    digest
}
