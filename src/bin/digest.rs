// Entry point for a scheduled reminder run (cron, systemd timer, Task Scheduler)

use anyhow::{Context, anyhow, bail};
use chrono::NaiveDate;
use task_digest::core::config::AppConfig;
use task_digest::digest::DigestTemplates;
use task_digest::mail::SmtpSender;
use task_digest::sharepoint::SharePointClient;
use task_digest::utils::dates::today_in;
use task_digest::worker::{RunReport, notify_failure, run_digest};
use tracing::{error, info};

async fn execute(
    config: &AppConfig,
    sender: &SmtpSender,
    today: NaiveDate,
) -> anyhow::Result<RunReport> {
    let templates = DigestTemplates::load(&config.template_dir)
        .context("Failed to load email templates")?;

    let client = SharePointClient::new(config);
    client.connect().await?;

    let report = run_digest(config, &client, sender, &templates, today).await?;
    if report.has_failures() {
        let failed = report
            .failed
            .iter()
            .map(|(email, err)| format!("{email}: {err}"))
            .collect::<Vec<_>>()
            .join("\n");
        bail!(
            "{} of {} digest(s) could not be sent:\n{}",
            report.failed.len(),
            report.failed.len() + report.sent.len(),
            failed
        );
    }
    Ok(report)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    task_digest::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        anyhow!(e)
    })?;
    let sender = SmtpSender::new(&config.smtp)?;
    let today = today_in(config.time_zone);

    match execute(&config, &sender, today).await {
        Ok(report) => {
            info!(
                "Reminder run {} complete: {} digest(s) sent",
                report.run_id,
                report.sent.len()
            );
            Ok(())
        }
        Err(e) => {
            error!("Reminder run failed: {:#}", e);
            notify_failure(&sender, &config, today, &format!("{e:?}"))
                .await
                .context("Failed to send error notification")?;
            Err(e)
        }
    }
}
