//! Delivery of rendered digests

pub mod archive;
pub mod sender;

use async_trait::async_trait;

use crate::core::models::Envelope;
use crate::errors::DigestError;

pub use archive::{archive_digest, archive_file_name};
pub use sender::SmtpSender;

/// Delivers one message. Callers decide what a failure means for the rest of a batch.
#[async_trait]
pub trait DispatchSink: Send + Sync {
    async fn send(&self, envelope: &Envelope) -> Result<(), DigestError>;
}
