//! Conversion of SharePoint REST rows into [`ListItem`]s.

use chrono_tz::Tz;
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::models::{FieldValue, ListItem};
use crate::errors::DigestError;
use crate::utils::dates::{has_offset, parse_in_zone};

/// Build a [`ListItem`] from one JSON row (`odata=nometadata` shape).
///
/// # Errors
///
/// Returns [`DigestError::ParseError`] when the row carries no numeric `Id`.
pub fn normalize_item(row: &Map<String, Value>, tz: Tz) -> Result<ListItem, DigestError> {
    let id = row
        .get("Id")
        .or_else(|| row.get("ID"))
        .and_then(Value::as_i64)
        .ok_or_else(|| DigestError::ParseError("list item without numeric Id".to_string()))?;

    let mut item = ListItem::new(id);
    for (name, value) in row {
        if name.starts_with("odata.") || name.starts_with("__") {
            continue;
        }
        if let Some(field) = normalize_value(value, tz) {
            item.fields.insert(name.clone(), field);
        }
    }
    Ok(item)
}

/// Map a JSON value onto a [`FieldValue`]; `None` for nulls and shapes with no display form.
#[must_use]
pub fn normalize_value(value: &Value, tz: Tz) -> Option<FieldValue> {
    match value {
        Value::Null => None,
        Value::String(s) if has_offset(s) => parse_in_zone(s, tz).map(FieldValue::Date),
        Value::String(s) => Some(FieldValue::Text(s.clone())),
        Value::Bool(b) => Some(FieldValue::Text(b.to_string())),
        Value::Number(n) => Some(FieldValue::Text(n.to_string())),
        Value::Object(map) => lookup_value(map),
        Value::Array(values) => {
            let parts: Vec<String> = values
                .iter()
                .filter_map(|v| match normalize_value(v, tz)? {
                    FieldValue::Text(s) => Some(s),
                    FieldValue::Lookup { display, .. } => Some(display),
                    FieldValue::Date(_) => None,
                })
                .collect();
            (!parts.is_empty()).then(|| FieldValue::Text(parts.join("; ")))
        }
    }
}

fn lookup_value(map: &Map<String, Value>) -> Option<FieldValue> {
    let (id, display) = if let Some(id) = map.get("LookupId").and_then(Value::as_i64) {
        (id, map.get("LookupValue"))
    } else if let Some(id) = map.get("Id").and_then(Value::as_i64) {
        (id, map.get("Title"))
    } else {
        debug!("Ignoring object field without lookup shape");
        return None;
    };

    let display = display
        .and_then(Value::as_str)
        .map_or_else(|| id.to_string(), str::to_string);
    Some(FieldValue::Lookup { id, display })
}
