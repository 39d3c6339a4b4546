use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use task_digest::DigestError;
use task_digest::core::config::AppConfig;
use task_digest::core::models::{Envelope, ListItem};
use task_digest::digest::DigestTemplates;
use task_digest::mail::{DispatchSink, archive_file_name};
use task_digest::sharepoint::ItemSource;
use task_digest::worker::{error_envelope, notify_failure, run_digest};

const EDIT_URL: &str = "https://contoso.example/Lists/Tasks/EditForm.aspx";

struct FakeSource {
    items: Vec<ListItem>,
    emails: HashMap<i64, String>,
    lookups: Mutex<Vec<i64>>,
    fail_fetch: bool,
}

impl FakeSource {
    fn new(items: Vec<ListItem>) -> Self {
        let emails = HashMap::from([
            (10, "ada@contoso.example".to_string()),
            (20, "grace@contoso.example".to_string()),
            (30, "linus@contoso.example".to_string()),
        ]);
        Self {
            items,
            emails,
            lookups: Mutex::new(Vec::new()),
            fail_fetch: false,
        }
    }
}

#[async_trait]
impl ItemSource for FakeSource {
    async fn edit_form_url(&self) -> Result<String, DigestError> {
        Ok(EDIT_URL.to_string())
    }

    async fn fetch_items(&self) -> Result<Vec<ListItem>, DigestError> {
        if self.fail_fetch {
            return Err(DigestError::ApiError("401 Unauthorized".into()));
        }
        Ok(self.items.clone())
    }

    async fn resolve_email(&self, user_id: i64) -> Result<Option<String>, DigestError> {
        self.lookups.lock().unwrap().push(user_id);
        Ok(self.emails.get(&user_id).cloned())
    }
}

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<Envelope>>,
    reject: Option<String>,
}

#[async_trait]
impl DispatchSink for RecordingSink {
    async fn send(&self, envelope: &Envelope) -> Result<(), DigestError> {
        if self.reject.as_deref() == Some(envelope.to.as_str()) {
            return Err(DigestError::MailError("mailbox unavailable".into()));
        }
        self.sent.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

fn config(archive_dir: Option<&std::path::Path>) -> AppConfig {
    let mut vars: HashMap<&str, String> = HashMap::from([
        ("SITE_URL", "https://contoso.example/sites/team".to_string()),
        ("LIST_TITLE", "Tasks".to_string()),
        ("FROM_EMAIL", "reminders@contoso.example".to_string()),
        ("CC_EMAIL", "pmo@contoso.example".to_string()),
        ("ERROR_TO", "ops@contoso.example".to_string()),
        ("SMTP_SERVER", "localhost".to_string()),
        ("EMAIL_SUBJECT", "Reminders for {0}".to_string()),
        ("WAY_OVERDUE_DELTA", "5".to_string()),
    ]);
    if let Some(dir) = archive_dir {
        vars.insert("ARCHIVE_DIR", dir.display().to_string());
    }
    AppConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

fn templates() -> DigestTemplates {
    DigestTemplates::new(
        "@{HAS_WAY_OVERDUE_TASK}WO:@{WAY_OVERDUE_TASKS}@{/HAS_WAY_OVERDUE_TASK}\
@{HAS_OVERDUE_TASK}O:@{OVERDUE_TASKS}@{/HAS_OVERDUE_TASK}\
@{HAS_TODAY_TASKS}T:@{TODAY_TASKS}@{/HAS_TODAY_TASKS}\
@{HAS_TOMORROW_TASKS}TM:@{TOMORROW_TASKS}@{/HAS_TOMORROW_TASKS}\
@{HAS_THISWEEK_TASKS}W:@{THISWEEK_TASKS}@{/HAS_THISWEEK_TASKS}",
        "[@{Title}]",
    )
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
}

fn task(id: i64, assignee: i64, due: &str, status: &str) -> ListItem {
    ListItem::new(id)
        .with_text("Title", &format!("Task {id}"))
        .with_text("Status", status)
        .with_text("DueDate", due)
        .with_lookup("AssignedTo", assignee, "someone")
}

fn items() -> Vec<ListItem> {
    vec![
        task(1, 10, "2024-06-12", "Open"),
        task(2, 20, "2024-06-13", "Open"),
        task(3, 10, "2024-06-11", "Open"),
        task(4, 20, "2024-06-12", "Completed"),
        task(5, 30, "2024-08-01", "Open"),
        task(6, 99, "2024-06-12", "Open"),
        ListItem::new(7)
            .with_text("Title", "Unassigned")
            .with_text("DueDate", "2024-06-12"),
    ]
}

#[tokio::test]
async fn test_run_sends_one_digest_per_recipient() {
    let source = FakeSource::new(items());
    let sink = RecordingSink::default();

    let report = run_digest(&config(None), &source, &sink, &templates(), today())
        .await
        .unwrap();

    assert_eq!(report.items_fetched, 7);
    assert_eq!(report.recipients, 3);
    assert_eq!(report.suppressed, 1);
    assert_eq!(report.sent, vec!["ada@contoso.example", "grace@contoso.example"]);
    assert!(!report.has_failures());

    let sent = sink.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "ada@contoso.example");
    assert_eq!(sent[0].from, "reminders@contoso.example");
    assert_eq!(sent[0].cc.as_deref(), Some("pmo@contoso.example"));
    assert_eq!(sent[0].subject, "Reminders for Wednesday, June 12, 2024");
    assert_eq!(sent[0].html_body, "O:[Task 3]T:[Task 1]");
    assert_eq!(sent[1].html_body, "TM:[Task 2]");
}

#[tokio::test]
async fn test_each_assignee_is_resolved_once() {
    let source = FakeSource::new(items());
    let sink = RecordingSink::default();

    run_digest(&config(None), &source, &sink, &templates(), today())
        .await
        .unwrap();

    let mut lookups = source.lookups.lock().unwrap().clone();
    lookups.sort_unstable();
    // Task 4 is completed, so user 20 is only looked up for task 2
    assert_eq!(lookups, vec![10, 20, 30, 99]);
}

#[tokio::test]
async fn test_send_failure_does_not_stop_other_recipients() {
    let source = FakeSource::new(items());
    let sink = RecordingSink {
        reject: Some("ada@contoso.example".into()),
        ..RecordingSink::default()
    };

    let report = run_digest(&config(None), &source, &sink, &templates(), today())
        .await
        .unwrap();

    assert!(report.has_failures());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "ada@contoso.example");
    assert_eq!(report.sent, vec!["grace@contoso.example"]);
}

#[tokio::test]
async fn test_source_failure_aborts_the_run() {
    let mut source = FakeSource::new(items());
    source.fail_fetch = true;
    let sink = RecordingSink::default();

    let result = run_digest(&config(None), &source, &sink, &templates(), today()).await;

    assert!(matches!(result, Err(DigestError::ApiError(_))));
    assert!(sink.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rendered_digests_are_archived() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("out");
    let source = FakeSource::new(items());
    let sink = RecordingSink::default();

    run_digest(&config(Some(&archive)), &source, &sink, &templates(), today())
        .await
        .unwrap();

    let ada = std::fs::read_to_string(archive.join(archive_file_name("ada@contoso.example")))
        .unwrap();
    assert_eq!(ada, "O:[Task 3]T:[Task 1]");
    assert!(!archive.join(archive_file_name("linus@contoso.example")).exists());
}

#[tokio::test]
async fn test_failure_notification_goes_to_error_address() {
    let sink = RecordingSink::default();
    let cfg = config(None);

    notify_failure(&sink, &cfg, today(), "boom <script>")
        .await
        .unwrap();

    let sent = sink.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0], error_envelope(&cfg, today(), "boom <script>"));
    assert_eq!(sent[0].to, "ops@contoso.example");
    assert_eq!(sent[0].cc.as_deref(), Some("ops@contoso.example"));
    assert_eq!(sent[0].html_body, "<pre>boom &lt;script&gt;</pre>");
    assert!(sent[0].subject.contains("Wednesday, June 12, 2024"));
}
