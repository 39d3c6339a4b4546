//! SMTP delivery of rendered digests.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use super::DispatchSink;
use crate::core::config::SmtpConfig;
use crate::core::models::Envelope;
use crate::errors::DigestError;

/// Line width of the plain-text alternative part.
const TEXT_WIDTH: usize = 100;

/// Sends envelopes through one SMTP relay.
pub struct SmtpSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpSender {
    /// Build the transport. With `ssl` the connection is upgraded via STARTTLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS relay cannot be configured.
    pub fn new(config: &SmtpConfig) -> Result<Self, DigestError> {
        let builder = if config.ssl {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
        };
        let mut builder = builder.port(config.port);

        if let Some(username) = &config.username {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                config.password.clone().unwrap_or_default(),
            ));
        }

        Ok(Self {
            mailer: builder.build(),
        })
    }
}

/// HTML body plus a plain-text rendering of it.
///
/// # Errors
///
/// Returns an error if an address does not parse or the message cannot be built.
pub fn build_message(envelope: &Envelope) -> Result<Message, DigestError> {
    let from: Mailbox = envelope.from.parse()?;
    let to: Mailbox = envelope.to.parse()?;

    let mut builder = Message::builder().from(from).to(to).subject(&envelope.subject);
    if let Some(cc) = envelope.cc.as_deref().filter(|c| !c.trim().is_empty()) {
        builder = builder.cc(cc.parse::<Mailbox>()?);
    }

    let text_body = html2text::from_read(envelope.html_body.as_bytes(), TEXT_WIDTH)
        .unwrap_or_else(|e| {
            warn!("Plain-text rendering failed, sending HTML only as text: {}", e);
            envelope.html_body.clone()
        });

    let message = builder.multipart(
        MultiPart::alternative()
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(text_body),
            )
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(envelope.html_body.clone()),
            ),
    )?;
    Ok(message)
}

#[async_trait]
impl DispatchSink for SmtpSender {
    async fn send(&self, envelope: &Envelope) -> Result<(), DigestError> {
        let message = build_message(envelope)?;
        self.mailer.send(message).await?;
        info!(
            to = %envelope.to,
            subject = %envelope.subject,
            "Email sent"
        );
        Ok(())
    }
}
