//! The list store items are read from

pub mod client;
pub mod normalize;

use async_trait::async_trait;

use crate::core::models::ListItem;
use crate::errors::DigestError;

pub use client::SharePointClient;

/// Supplies list items and resolves who they are assigned to.
///
/// Any error aborts the run; nothing here is retried.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Absolute URL of the list's edit form; items link to `<url>?ID=<id>`.
    async fn edit_form_url(&self) -> Result<String, DigestError>;

    async fn fetch_items(&self) -> Result<Vec<ListItem>, DigestError>;

    /// Email address of the site user with this id, if they have one.
    async fn resolve_email(&self, user_id: i64) -> Result<Option<String>, DigestError>;
}
