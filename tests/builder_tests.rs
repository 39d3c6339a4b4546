use chrono::NaiveDate;
use task_digest::DigestError;
use task_digest::core::models::{Bucket, ListItem, RecipientBuckets, RecipientDigest};
use task_digest::digest::{DigestTemplates, build, format_subject, render_recipient};

const EDIT_URL: &str = "https://contoso.example/Lists/Tasks/EditForm.aspx";

const DIGEST_TEMPLATE: &str = "<h1>Tasks for @{TODAY}</h1>\
@{HAS_WAY_OVERDUE_TASK}<h2>Way overdue</h2><ul>@{WAY_OVERDUE_TASKS}</ul>@{/HAS_WAY_OVERDUE_TASK}\
@{HAS_OVERDUE_TASK}<h2>Overdue</h2><ul>@{OVERDUE_TASKS}</ul>@{/HAS_OVERDUE_TASK}\
@{HAS_TODAY_TASKS}<h2>Today</h2><ul>@{TODAY_TASKS}</ul>@{/HAS_TODAY_TASKS}\
@{HAS_TOMORROW_TASKS}<h2>Tomorrow</h2><ul>@{TOMORROW_TASKS}</ul>@{/HAS_TOMORROW_TASKS}\
@{HAS_THISWEEK_TASKS}<h2>This week</h2><ul>@{THISWEEK_TASKS}</ul>@{/HAS_THISWEEK_TASKS}";

const ITEM_TEMPLATE: &str = r#"<li><a href="@{EditUrl}">@{Title}</a></li>"#;

fn templates() -> DigestTemplates {
    DigestTemplates::new(DIGEST_TEMPLATE, ITEM_TEMPLATE)
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
}

fn item(id: i64, title: &str) -> ListItem {
    ListItem::new(id).with_text("Title", title)
}

#[test]
fn test_renders_only_non_empty_sections_in_order() {
    let mut buckets = RecipientBuckets::new("ada@contoso.example");
    buckets.push(Bucket::ThisWeek, item(3, "Plan offsite"));
    buckets.push(Bucket::WayOverdue, item(1, "File expenses"));
    buckets.push(Bucket::WayOverdue, item(2, "Renew badge"));

    let doc = render_recipient(&buckets, &templates(), EDIT_URL, today())
        .unwrap()
        .expect("digest should be rendered");

    assert_eq!(doc.email, "ada@contoso.example");
    assert_eq!(doc.item_count, 3);
    assert_eq!(
        doc.html,
        format!(
            "<h1>Tasks for Wednesday, June 12, 2024</h1>\
<h2>Way overdue</h2><ul>\
<li><a href=\"{EDIT_URL}?ID=1\">File expenses</a></li>\
<li><a href=\"{EDIT_URL}?ID=2\">Renew badge</a></li></ul>\
<h2>This week</h2><ul><li><a href=\"{EDIT_URL}?ID=3\">Plan offsite</a></li></ul>"
        )
    );
    assert!(!doc.html.contains("@{"), "no markers or tokens may survive");
}

#[test]
fn test_empty_recipient_is_suppressed() {
    let buckets = RecipientBuckets::new("idle@contoso.example");
    let doc = render_recipient(&buckets, &templates(), EDIT_URL, today()).unwrap();
    assert!(doc.is_none());
}

#[test]
fn test_build_skips_suppressed_recipients() {
    let mut digest = RecipientDigest::new();
    digest.entry("idle@contoso.example");
    digest
        .entry("busy@contoso.example")
        .push(Bucket::Today, item(5, "Stand-up notes"));
    digest.entry("idle2@contoso.example");

    let rendered = build(&digest, &templates(), EDIT_URL, today()).unwrap();
    let emails: Vec<&str> = rendered.iter().map(|d| d.email.as_str()).collect();
    assert_eq!(emails, vec!["busy@contoso.example"]);
    assert!(rendered[0].html.contains("<h2>Today</h2>"));
    assert!(!rendered[0].html.contains("Overdue"));
}

#[test]
fn test_missing_block_is_a_template_error() {
    let mut buckets = RecipientBuckets::new("ada@contoso.example");
    buckets.push(Bucket::Today, item(1, "x"));
    let broken = DigestTemplates::new("@{HAS_TODAY_TASKS}@{TODAY_TASKS}@{/HAS_TODAY_TASKS}", ITEM_TEMPLATE);

    let result = render_recipient(&buckets, &broken, EDIT_URL, today());
    assert!(matches!(result, Err(DigestError::TemplateError(_))));
}

#[test]
fn test_format_subject() {
    assert_eq!(
        format_subject("Your tasks for {0}", today()),
        "Your tasks for Wednesday, June 12, 2024"
    );
    assert_eq!(format_subject("No date", today()), "No date");
}

#[test]
fn test_load_templates_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("email_template.html"), DIGEST_TEMPLATE).unwrap();
    std::fs::write(dir.path().join("task_template.html"), ITEM_TEMPLATE).unwrap();

    let loaded = DigestTemplates::load(dir.path()).unwrap();
    assert_eq!(loaded, templates());
}

#[test]
fn test_load_templates_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("email_template.html"), DIGEST_TEMPLATE).unwrap();

    let err = DigestTemplates::load(dir.path()).unwrap_err();
    assert!(matches!(err, DigestError::IoError(ref msg) if msg.contains("task_template.html")));
}

#[test]
fn test_shipped_templates_render_cleanly() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
    let shipped = DigestTemplates::load(&dir).unwrap();

    let mut buckets = RecipientBuckets::new("ada@contoso.example");
    buckets.push(
        Bucket::Overdue,
        item(8, "Quarterly review")
            .with_text("DueDate", "2024-06-10")
            .with_text("Status", "In Progress")
            .with_text("Body", "<p>Collect the <em>numbers</em></p>"),
    );

    let doc = render_recipient(&buckets, &shipped, EDIT_URL, today())
        .unwrap()
        .unwrap();
    assert!(!doc.html.contains("@{"));
    assert!(!doc.html.contains("Unknown key"));
    assert!(doc.html.contains("Monday, June 10, 2024"));
    assert!(doc.html.contains("Collect the numbers"));
    assert!(!doc.html.contains("Due today"));
}
