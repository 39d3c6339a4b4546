use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono_tz::Tz;

use crate::digest::classify::ClassifierSettings;

pub const DEFAULT_MAX_ITEMS: u32 = 100;
pub const DEFAULT_WAY_OVERDUE_DELTA: i64 = 7;
/// Largest accepted `WAY_OVERDUE_DELTA`, in days.
pub const MAX_WAY_OVERDUE_DELTA: i64 = 36_500;
pub const DEFAULT_SMTP_PORT: u16 = 25;
pub const DEFAULT_EMAIL_SUBJECT: &str = "Task reminders for {0}";
pub const DEFAULT_ERROR_EMAIL_SUBJECT: &str = "Task reminder run failed on {0}";

/// How the SharePoint client authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteCredentials {
    Anonymous,
    Basic { username: String, password: String },
    Bearer(String),
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub ssl: bool,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub site_url: String,
    pub list_title: String,
    pub credentials: SiteCredentials,
    pub max_items: u32,
    pub filter_field_name: String,
    pub filter_field_value: String,
    pub due_date_field_name: String,
    pub modified_field_name: String,
    pub assigned_to_field_name: String,
    pub way_overdue_delta: i64,
    pub from_email: String,
    pub cc_email: Option<String>,
    pub error_to: String,
    pub email_subject: String,
    pub error_email_subject: String,
    pub smtp: SmtpConfig,
    pub template_dir: PathBuf,
    pub archive_dir: Option<PathBuf>,
    pub time_zone: Tz,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| format!("{key}: environment variable not found"));
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let credentials = match (get("SP_BEARER_TOKEN"), get("SP_USERNAME")) {
            (Some(token), _) => SiteCredentials::Bearer(token),
            (None, Some(user)) => SiteCredentials::Basic {
                username: match get("SP_DOMAIN") {
                    Some(domain) => format!("{domain}\\{user}"),
                    None => user,
                },
                password: get("SP_PASSWORD").unwrap_or_default(),
            },
            (None, None) => SiteCredentials::Anonymous,
        };

        Ok(Self {
            site_url: required("SITE_URL")?,
            list_title: required("LIST_TITLE")?,
            credentials,
            max_items: parse_or(get("MAX_ITEMS"), "MAX_ITEMS", DEFAULT_MAX_ITEMS)?,
            filter_field_name: or_default("FILTER_FIELD_NAME", "Status"),
            filter_field_value: or_default("FILTER_FIELD_VALUE", "Completed"),
            due_date_field_name: or_default("DUE_DATE_FIELD_NAME", "DueDate"),
            modified_field_name: or_default("MODIFIED_FIELD_NAME", "Modified"),
            assigned_to_field_name: or_default("ASSIGNED_TO_FIELD_NAME", "AssignedTo"),
            way_overdue_delta: parse_way_overdue_delta(get("WAY_OVERDUE_DELTA"))?,
            from_email: required("FROM_EMAIL")?,
            cc_email: get("CC_EMAIL"),
            error_to: required("ERROR_TO")?,
            email_subject: or_default("EMAIL_SUBJECT", DEFAULT_EMAIL_SUBJECT),
            error_email_subject: or_default("ERROR_EMAIL_SUBJECT", DEFAULT_ERROR_EMAIL_SUBJECT),
            smtp: SmtpConfig {
                server: required("SMTP_SERVER")?,
                port: parse_or(get("SMTP_PORT"), "SMTP_PORT", DEFAULT_SMTP_PORT)?,
                ssl: parse_bool(get("SMTP_SSL"), "SMTP_SSL")?,
                username: get("SMTP_USERNAME"),
                password: get("SMTP_PASSWORD"),
            },
            template_dir: PathBuf::from(or_default("TEMPLATE_DIR", ".")),
            archive_dir: get("ARCHIVE_DIR").map(PathBuf::from),
            time_zone: match get("TIME_ZONE") {
                Some(name) => name
                    .parse::<Tz>()
                    .map_err(|e| format!("TIME_ZONE: {e}"))?,
                None => Tz::UTC,
            },
        })
    }

    #[must_use]
    pub fn classifier_settings(&self) -> ClassifierSettings {
        ClassifierSettings {
            filter_field: self.filter_field_name.clone(),
            filter_value: self.filter_field_value.clone(),
            due_date_field: self.due_date_field_name.clone(),
            modified_field: self.modified_field_name.clone(),
            way_overdue_delta_days: self.way_overdue_delta,
        }
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| format!("{key}: {e}")),
        None => Ok(default),
    }
}

fn parse_way_overdue_delta(raw: Option<String>) -> Result<i64, String> {
    let days = parse_or(raw, "WAY_OVERDUE_DELTA", DEFAULT_WAY_OVERDUE_DELTA)?;
    if (0..=MAX_WAY_OVERDUE_DELTA).contains(&days) {
        Ok(days)
    } else {
        Err(format!(
            "WAY_OVERDUE_DELTA: expected 0 to {MAX_WAY_OVERDUE_DELTA} days, got {days}"
        ))
    }
}

fn parse_bool(raw: Option<String>, key: &str) -> Result<bool, String> {
    match raw.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(format!("{key}: expected a boolean, got '{other}'")),
    }
}
