//! task-digest - Emails each assignee of a SharePoint task list a digest of what is due.
//!
//! A run has three stages:
//! 1. Fetch the list items and resolve each assignee's email address
//! 2. Classify every open item into an urgency bucket (way overdue, overdue,
//!    today, tomorrow, this week) per recipient
//! 3. Render one HTML digest per recipient from the block/token templates and
//!    send it by SMTP
//!
//! # Architecture
//!
//! The system uses:
//! - reqwest against the SharePoint REST API (`sharepoint`)
//! - a flat `@{BLOCK}`/`@{TOKEN}` template engine (`digest::template`)
//! - lettre for SMTP delivery (`mail`)
//! - Tokio for async runtime
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use task_digest::core::models::{ListItem, RecipientDigest};
//! use task_digest::digest::{ClassifierSettings, DigestTemplates, build, classify};
//!
//! let settings = ClassifierSettings {
//!     filter_field: "Status".into(),
//!     filter_value: "Completed".into(),
//!     due_date_field: "DueDate".into(),
//!     modified_field: "Modified".into(),
//!     way_overdue_delta_days: 7,
//! };
//! let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
//! let items = vec![
//!     ListItem::new(1)
//!         .with_text("Title", "Ship release")
//!         .with_text("DueDate", "2024-06-12"),
//! ];
//!
//! let digest: RecipientDigest =
//!     classify(&items, |_| Some("ada@contoso.example".into()), &settings, today);
//! let templates = DigestTemplates::new(
//!     "@{HAS_WAY_OVERDUE_TASK}@{WAY_OVERDUE_TASKS}@{/HAS_WAY_OVERDUE_TASK}\
//!      @{HAS_OVERDUE_TASK}@{OVERDUE_TASKS}@{/HAS_OVERDUE_TASK}\
//!      @{HAS_TODAY_TASKS}Today: @{TODAY_TASKS}@{/HAS_TODAY_TASKS}\
//!      @{HAS_TOMORROW_TASKS}@{TOMORROW_TASKS}@{/HAS_TOMORROW_TASKS}\
//!      @{HAS_THISWEEK_TASKS}@{THISWEEK_TASKS}@{/HAS_THISWEEK_TASKS}",
//!     "<li>@{Title}</li>",
//! );
//!
//! let rendered = build(&digest, &templates, "https://contoso.example/EditForm.aspx", today).unwrap();
//! assert_eq!(rendered[0].html, "Today: <li>Ship release</li>");
//! ```

pub mod core;
pub mod digest;
pub mod errors;
pub mod mail;
pub mod sharepoint;
pub mod utils;
pub mod worker;

pub use errors::DigestError;

/// Configure structured logging with JSON format.
///
/// Log levels come from `RUST_LOG` (default `info`). Calling this more than
/// once keeps the first subscriber.
///
/// # Example
///
/// ```
/// task_digest::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
