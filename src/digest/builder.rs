//! Turns classified buckets into one HTML document per recipient.

use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info};

use super::template::{TokenTable, render_items, replace_tokens, resolve_named_block, token};
use crate::core::models::{Bucket, RecipientBuckets, RecipientDigest};
use crate::errors::DigestError;
use crate::utils::dates::long_date;

pub const DIGEST_TEMPLATE_FILE: &str = "email_template.html";
pub const ITEM_TEMPLATE_FILE: &str = "task_template.html";

/// The outer digest template and the per-item template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestTemplates {
    pub digest: String,
    pub item: String,
}

impl DigestTemplates {
    #[must_use]
    pub fn new(digest: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
            item: item.into(),
        }
    }

    /// Read `email_template.html` and `task_template.html` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be read.
    pub fn load(dir: &Path) -> Result<Self, DigestError> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path)
                .map_err(|e| DigestError::IoError(format!("{}: {e}", path.display())))
        };
        Ok(Self {
            digest: read(DIGEST_TEMPLATE_FILE)?,
            item: read(ITEM_TEMPLATE_FILE)?,
        })
    }
}

/// A finished digest ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDigest {
    pub email: String,
    pub html: String,
    pub item_count: usize,
}

/// Render the digest of a single recipient; `None` when they have nothing due.
///
/// # Errors
///
/// Returns [`DigestError::TemplateError`] when the digest template lacks one of
/// the bucket blocks.
pub fn render_recipient(
    buckets: &RecipientBuckets,
    templates: &DigestTemplates,
    edit_url_base: &str,
    today: NaiveDate,
) -> Result<Option<RenderedDigest>, DigestError> {
    if buckets.is_empty() {
        info!("No immediate reminder for {} (No tasks.)", buckets.email);
        return Ok(None);
    }

    let mut document = templates.digest.clone();
    let mut tokens = TokenTable::new();
    tokens.insert(token("TODAY"), long_date(today));

    for bucket in Bucket::ALL {
        let items = buckets.items(bucket);
        document = resolve_named_block(&document, bucket.block_name(), !items.is_empty())?;
        tokens.insert(
            token(bucket.list_token()),
            render_items(&templates.item, items, edit_url_base),
        );
        debug!(
            "{}: {:?} has {} item(s)",
            buckets.email,
            bucket,
            items.len()
        );
    }

    Ok(Some(RenderedDigest {
        email: buckets.email.clone(),
        html: replace_tokens(&document, &tokens),
        item_count: buckets.total(),
    }))
}

/// Render every recipient that has at least one item, in recipient order.
///
/// # Errors
///
/// Returns the first template error; template problems affect every recipient alike.
pub fn build(
    digest: &RecipientDigest,
    templates: &DigestTemplates,
    edit_url_base: &str,
    today: NaiveDate,
) -> Result<Vec<RenderedDigest>, DigestError> {
    let mut rendered = Vec::with_capacity(digest.len());
    for buckets in digest.iter() {
        if let Some(doc) = render_recipient(buckets, templates, edit_url_base, today)? {
            rendered.push(doc);
        }
    }
    Ok(rendered)
}

/// Expand a `{0}`-style subject format with today's long date.
#[must_use]
pub fn format_subject(format: &str, today: NaiveDate) -> String {
    format.replace("{0}", &long_date(today))
}
