//! Flat template engine: `@{NAME}` ... `@{/NAME}` conditional blocks and `@{KEY}` tokens.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use tracing::warn;

use crate::core::models::{FieldValue, ListItem};
use crate::errors::DigestError;
use crate::utils::dates::{long_date, parse_naive};

/// Literal token key -> replacement text.
pub type TokenTable = BTreeMap<String, String>;

/// Maximum characters of an item body shown by `@{ShortBody}`.
pub const SHORT_BODY_LEN: usize = 300;

static ITEM_TOKEN_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"@\{([^}]*)\}").unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

static MARKUP_TAG_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"<[^>]*>").unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

/// `@{NAME}`
#[must_use]
pub fn token(name: &str) -> String {
    format!("@{{{name}}}")
}

/// `@{/NAME}`
#[must_use]
pub fn end_marker(name: &str) -> String {
    format!("@{{/{name}}}")
}

/// Keep or drop the first `start` ... `end` region of `template`.
///
/// With `keep` only the two markers are removed; otherwise the markers and
/// everything between them go.
///
/// # Errors
///
/// Returns [`DigestError::TemplateError`] when either marker is missing.
pub fn resolve_block(
    template: &str,
    start: &str,
    end: &str,
    keep: bool,
) -> Result<String, DigestError> {
    let start_pos = template
        .find(start)
        .ok_or_else(|| DigestError::TemplateError(format!("block start {start} not found")))?;
    let body_start = start_pos + start.len();
    let end_pos = template[body_start..]
        .find(end)
        .map(|offset| body_start + offset)
        .ok_or_else(|| {
            DigestError::TemplateError(format!("block end {end} not found after {start}"))
        })?;

    let mut out = String::with_capacity(template.len());
    out.push_str(&template[..start_pos]);
    if keep {
        out.push_str(&template[body_start..end_pos]);
    }
    out.push_str(&template[end_pos + end.len()..]);
    Ok(out)
}

/// [`resolve_block`] for the block called `name`.
///
/// # Errors
///
/// Returns [`DigestError::TemplateError`] when the block markers are missing.
pub fn resolve_named_block(template: &str, name: &str, keep: bool) -> Result<String, DigestError> {
    resolve_block(template, &token(name), &end_marker(name), keep)
}

/// Replace every occurrence of each key with its value.
///
/// Single pass: replacement text is never scanned again for further keys.
/// When keys overlap at one position the longest key wins.
#[must_use]
pub fn replace_tokens(template: &str, tokens: &TokenTable) -> String {
    let mut keys: Vec<&str> = tokens
        .keys()
        .map(String::as_str)
        .filter(|k| !k.is_empty())
        .collect();
    if keys.is_empty() {
        return template.to_string();
    }
    keys.sort_by(|a, b| b.len().cmp(&a.len()));

    let pattern = keys
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    let Ok(re) = Regex::new(&pattern) else {
        warn!("Token pattern failed to compile; falling back to sequential replacement");
        return tokens
            .iter()
            .fold(template.to_string(), |acc, (k, v)| acc.replace(k, v));
    };

    re.replace_all(template, |caps: &regex::Captures<'_>| {
        tokens.get(&caps[0]).cloned().unwrap_or_default()
    })
    .into_owned()
}

/// Display text of every non-null field, keyed by field name.
#[must_use]
pub fn item_values(item: &ListItem) -> HashMap<String, String> {
    item.fields
        .iter()
        .map(|(name, value)| {
            let shown = match value {
                FieldValue::Lookup { display, .. } => display.clone(),
                FieldValue::Date(dt) => long_date(dt.date()),
                FieldValue::Text(text) => match parse_naive(text) {
                    Some(dt) => long_date(dt.date()),
                    None => text.clone(),
                },
            };
            (name.clone(), shown)
        })
        .collect()
}

/// Item body without markup, cut to [`SHORT_BODY_LEN`] characters plus `...`.
#[must_use]
pub fn short_body(item: &ListItem) -> String {
    let body = item.raw("Body");
    let stripped = MARKUP_TAG_RE.replace_all(&body, "");
    if stripped.chars().count() > SHORT_BODY_LEN {
        let mut cut: String = stripped.chars().take(SHORT_BODY_LEN).collect();
        cut.push_str("...");
        cut
    } else {
        stripped.into_owned()
    }
}

fn resolve_item_token(
    key: &str,
    item: &ListItem,
    edit_url_base: &str,
    values: &HashMap<String, String>,
) -> String {
    match key {
        "EditUrl" => format!("{edit_url_base}?ID={}", item.id),
        "ShortBody" => short_body(item),
        _ => match values.get(key) {
            Some(value) => value.clone(),
            None => {
                let available: Vec<&str> = item.fields.keys().map(String::as_str).collect();
                warn!(
                    "Unknown template key '{}' for item {}; available keys: {:?}",
                    key, item.id, available
                );
                format!("Unknown key:{key}")
            }
        },
    }
}

/// Expand every `@{key}` of `item_template` for one item.
#[must_use]
pub fn render_item_block(item_template: &str, item: &ListItem, edit_url_base: &str) -> String {
    let values = item_values(item);
    ITEM_TOKEN_RE
        .replace_all(item_template, |caps: &regex::Captures<'_>| {
            resolve_item_token(&caps[1], item, edit_url_base, &values)
        })
        .into_owned()
}

/// Rendered blocks of `items`, concatenated in order. Empty for no items.
#[must_use]
pub fn render_items(item_template: &str, items: &[ListItem], edit_url_base: &str) -> String {
    items
        .iter()
        .map(|item| render_item_block(item_template, item, edit_url_base))
        .collect()
}
