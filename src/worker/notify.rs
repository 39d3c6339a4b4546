use chrono::NaiveDate;
use tracing::info;

use crate::core::config::AppConfig;
use crate::core::models::Envelope;
use crate::digest::format_subject;
use crate::errors::DigestError;
use crate::mail::DispatchSink;

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// The operational error mail, addressed to `ERROR_TO` on both the To and Cc lines.
#[must_use]
pub fn error_envelope(config: &AppConfig, today: NaiveDate, details: &str) -> Envelope {
    Envelope {
        from: config.from_email.clone(),
        to: config.error_to.clone(),
        cc: Some(config.error_to.clone()),
        subject: format_subject(&config.error_email_subject, today),
        html_body: format!("<pre>{}</pre>", escape_html(details)),
    }
}

/// # Errors
///
/// Returns an error if the notification itself cannot be sent.
pub async fn notify_failure(
    sink: &dyn DispatchSink,
    config: &AppConfig,
    today: NaiveDate,
    details: &str,
) -> Result<(), DigestError> {
    info!("Sending failure notification to {}", config.error_to);
    sink.send(&error_envelope(config, today, details)).await
}
