use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::config::AppConfig;
use crate::core::models::{Envelope, ListItem};
use crate::digest::classify::{ClassifierSettings, classify, is_filtered};
use crate::digest::{DigestTemplates, build, format_subject};
use crate::errors::DigestError;
use crate::mail::{DispatchSink, archive_digest};
use crate::sharepoint::ItemSource;

/// What a reminder run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: String,
    pub items_fetched: usize,
    pub recipients: usize,
    pub suppressed: usize,
    pub sent: Vec<String>,
    /// Recipient and error text for every digest that could not be sent.
    pub failed: Vec<(String, String)>,
}

impl RunReport {
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Look up the email of every assignee referenced by an unfiltered item, once per user.
///
/// # Errors
///
/// Returns the first item-source error.
pub async fn resolve_recipients(
    source: &dyn ItemSource,
    items: &[ListItem],
    assignee_field: &str,
    settings: &ClassifierSettings,
) -> Result<HashMap<i64, Option<String>>, DigestError> {
    let mut emails: HashMap<i64, Option<String>> = HashMap::new();
    for item in items.iter().filter(|item| !is_filtered(item, settings)) {
        let Some(user_id) = item.lookup_id(assignee_field) else {
            continue;
        };
        if emails.contains_key(&user_id) {
            continue;
        }
        let email = source.resolve_email(user_id).await?;
        if email.is_none() {
            warn!("No email address for user {}", user_id);
        }
        emails.insert(user_id, email);
    }
    Ok(emails)
}

/// Fetch, classify, render and dispatch every digest for `today`.
///
/// A failed send is recorded in the report and the remaining recipients are
/// still processed. Item-source and template errors abort the run.
///
/// # Errors
///
/// Returns an error if the item source fails or the templates are malformed.
pub async fn run_digest(
    config: &AppConfig,
    source: &dyn ItemSource,
    sink: &dyn DispatchSink,
    templates: &DigestTemplates,
    today: NaiveDate,
) -> Result<RunReport, DigestError> {
    let mut report = RunReport {
        run_id: Uuid::new_v4().to_string(),
        ..RunReport::default()
    };
    info!("Starting reminder run {} for {}", report.run_id, today);

    let edit_url = source.edit_form_url().await?;
    let items = source.fetch_items().await?;
    report.items_fetched = items.len();

    let settings = config.classifier_settings();
    let emails =
        resolve_recipients(source, &items, &config.assigned_to_field_name, &settings).await?;

    info!("Process items... (run_id={})", report.run_id);
    let digest = classify(
        &items,
        |item| {
            item.lookup_id(&config.assigned_to_field_name)
                .and_then(|id| emails.get(&id).cloned().flatten())
        },
        &settings,
        today,
    );
    report.recipients = digest.len();

    let rendered = build(&digest, templates, &edit_url, today)?;
    report.suppressed = digest.len() - rendered.len();
    let subject = format_subject(&config.email_subject, today);

    for doc in rendered {
        info!(
            "Send reminder for: {} ({} item(s), run_id={})",
            doc.email, doc.item_count, report.run_id
        );

        #[cfg(feature = "debug-logs")]
        info!("Rendered digest for {}:\n{}", doc.email, doc.html);

        if let Some(dir) = &config.archive_dir
            && let Err(e) = archive_digest(dir, &doc.email, &doc.html).await
        {
            warn!("Failed to archive digest for {}: {}", doc.email, e);
        }

        let envelope = Envelope {
            from: config.from_email.clone(),
            to: doc.email.clone(),
            cc: config.cc_email.clone(),
            subject: subject.clone(),
            html_body: doc.html,
        };

        match sink.send(&envelope).await {
            Ok(()) => report.sent.push(doc.email),
            Err(e) => {
                error!(
                    "Failed to send digest to {}: {} (run_id={})",
                    doc.email, e, report.run_id
                );
                report.failed.push((doc.email, e.to_string()));
            }
        }
    }

    info!(
        "Run {} finished: {} item(s), {} recipient(s), {} sent, {} suppressed, {} failed",
        report.run_id,
        report.items_fetched,
        report.recipients,
        report.sent.len(),
        report.suppressed,
        report.failed.len()
    );
    Ok(report)
}
