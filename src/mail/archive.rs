//! Copies of rendered digests written next to the run for inspection.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::DigestError;

/// `ada@contoso.example` -> `ada_contoso_example.html`
#[must_use]
pub fn archive_file_name(email: &str) -> String {
    format!("{}.html", email.replace(['@', '.'], "_"))
}

/// Write `html` to `<dir>/<archive_file_name(email)>`, replacing any earlier copy.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file written.
pub async fn archive_digest(dir: &Path, email: &str, html: &str) -> Result<PathBuf, DigestError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(archive_file_name(email));
    tokio::fs::write(&path, html).await?;
    debug!("Archived digest for {} at {}", email, path.display());
    Ok(path)
}
