//! SharePoint REST client
//!
//! Reads the task list, its edit form and the site user-info list.

use std::time::Duration;

use async_trait::async_trait;
use chrono_tz::Tz;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{info, warn};
use url::Url;

use super::ItemSource;
use super::normalize::normalize_item;
use crate::core::config::{AppConfig, SiteCredentials};
use crate::core::models::ListItem;
use crate::errors::DigestError;

const ODATA_JSON: &str = "application/json;odata=nometadata";

#[derive(Debug, Deserialize)]
struct WebInfo {
    #[serde(rename = "Title")]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListInfo {
    #[serde(rename = "DefaultEditFormUrl")]
    default_edit_form_url: String,
}

#[derive(Debug, Deserialize)]
struct ItemsResponse {
    value: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(rename = "EMail")]
    email: Option<String>,
}

/// `.../_api/web/lists/GetByTitle('<title>')`, with quotes doubled and the title percent-encoded.
#[must_use]
pub fn list_api_url(site_url: &str, list_title: &str) -> String {
    let escaped = list_title.replace('\'', "''");
    format!(
        "{}/_api/web/lists/GetByTitle('{}')",
        site_url.trim_end_matches('/'),
        utf8_percent_encode(&escaped, NON_ALPHANUMERIC)
    )
}

/// Items query with a row limit and the assignee lookup expanded to `Id`/`Title`.
#[must_use]
pub fn items_url(site_url: &str, list_title: &str, max_items: u32, assignee_field: &str) -> String {
    format!(
        "{}/items?$top={max_items}&$select=*,{assignee_field}/Id,{assignee_field}/Title&$expand={assignee_field}",
        list_api_url(site_url, list_title)
    )
}

#[must_use]
pub fn user_info_url(site_url: &str, user_id: i64) -> String {
    format!(
        "{}/_api/web/SiteUserInfoList/items({user_id})?$select=EMail",
        site_url.trim_end_matches('/')
    )
}

/// Absolute edit-form URL from the list's server-relative `DefaultEditFormUrl`.
///
/// # Errors
///
/// Returns an error if the site URL cannot be parsed.
pub fn edit_form_uri(site_url: &str, default_edit_form_url: &str) -> Result<String, DigestError> {
    let base = Url::parse(site_url)?;
    Ok(base.join(default_edit_form_url)?.to_string())
}

pub struct SharePointClient {
    http: Client,
    site_url: String,
    list_title: String,
    credentials: SiteCredentials,
    max_items: u32,
    assignee_field: String,
    time_zone: Tz,
}

impl SharePointClient {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            site_url: config.site_url.clone(),
            list_title: config.list_title.clone(),
            credentials: config.credentials.clone(),
            max_items: config.max_items,
            assignee_field: config.assigned_to_field_name.clone(),
            time_zone: config.time_zone,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            SiteCredentials::Anonymous => request,
            SiteCredentials::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            SiteCredentials::Bearer(token) => request.bearer_auth(token),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DigestError> {
        let resp = self
            .authorize(self.http.get(url))
            .header(ACCEPT, ODATA_JSON)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(DigestError::ApiError(format!(
                "GET {url} returned {status}: {body_text}"
            )));
        }

        resp.json::<T>()
            .await
            .map_err(|e| DigestError::ParseError(format!("GET {url}: {e}")))
    }

    /// Check the site answers with the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn connect(&self) -> Result<(), DigestError> {
        info!("Connecting to SharePoint: {} ...", self.site_url);
        let url = format!("{}/_api/web?$select=Title", self.site_url.trim_end_matches('/'));
        let web: WebInfo = self.get_json(&url).await?;
        info!(
            "Connected to SharePoint site '{}'",
            web.title.as_deref().unwrap_or("<untitled>")
        );
        Ok(())
    }
}

#[async_trait]
impl ItemSource for SharePointClient {
    async fn edit_form_url(&self) -> Result<String, DigestError> {
        info!("Getting list: {}...", self.list_title);
        let url = format!(
            "{}?$select=DefaultEditFormUrl",
            list_api_url(&self.site_url, &self.list_title)
        );
        let list: ListInfo = self.get_json(&url).await?;
        edit_form_uri(&self.site_url, &list.default_edit_form_url)
    }

    async fn fetch_items(&self) -> Result<Vec<ListItem>, DigestError> {
        info!("Getting items from list: {}...", self.list_title);
        let url = items_url(
            &self.site_url,
            &self.list_title,
            self.max_items,
            &self.assignee_field,
        );
        let response: ItemsResponse = self.get_json(&url).await?;

        let mut items = Vec::with_capacity(response.value.len());
        for row in &response.value {
            match normalize_item(row, self.time_zone) {
                Ok(item) => items.push(item),
                Err(e) => warn!("Skipping list row: {}", e),
            }
        }
        info!("Fetched {} item(s)", items.len());
        Ok(items)
    }

    async fn resolve_email(&self, user_id: i64) -> Result<Option<String>, DigestError> {
        let user: UserInfo = self
            .get_json(&user_info_url(&self.site_url, user_id))
            .await?;
        Ok(user.email.filter(|e| !e.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_title_is_quoted_and_encoded() {
        assert_eq!(
            list_api_url("https://contoso.example/sites/team/", "Bob's Tasks"),
            "https://contoso.example/sites/team/_api/web/lists/GetByTitle('Bob%27%27s%20Tasks')"
        );
    }

    #[test]
    fn items_url_expands_assignee() {
        let url = items_url("https://contoso.example/sites/team", "Tasks", 50, "AssignedTo");
        assert!(url.ends_with(
            "/items?$top=50&$select=*,AssignedTo/Id,AssignedTo/Title&$expand=AssignedTo"
        ));
    }

    #[test]
    fn edit_form_is_joined_onto_the_site_host() {
        let uri = edit_form_uri(
            "https://contoso.example/sites/team",
            "/sites/team/Lists/Tasks/EditForm.aspx",
        )
        .unwrap();
        assert_eq!(uri, "https://contoso.example/sites/team/Lists/Tasks/EditForm.aspx");
    }

    #[test]
    fn user_info_url_targets_the_user_list() {
        assert_eq!(
            user_info_url("https://contoso.example", 12),
            "https://contoso.example/_api/web/SiteUserInfoList/items(12)?$select=EMail"
        );
    }
}
