//! Delivery collaborators for contact submissions.
//!
//! DESIGN
//! ======
//! `Mailer` is the seam between the contact pipeline and whatever actually
//! sends mail. `LogMailer` logs and succeeds; `ResendMailer` calls the Resend
//! API. Both report failure through `MailError` so the caller can map it to a
//! generic user-facing message.

use std::sync::Arc;

use resend_rs::Resend;
use resend_rs::types::CreateEmailBaseOptions;

use crate::config::SiteConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("email delivery failed: {0}")]
    Delivery(String),
    #[error("email delivery timed out after {0}s")]
    Timeout(u64),
}

/// A fully rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Provider-neutral async delivery trait. Enables mocking in tests.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message.
    ///
    /// # Errors
    ///
    /// Returns a [`MailError`] if the provider rejects or cannot be reached.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

// =============================================================================
// LOG MAILER
// =============================================================================

/// Stand-in used when no provider is configured: logs the message and succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            bytes = email.html.len(),
            "contact message accepted (log-only delivery)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

// =============================================================================
// RESEND MAILER
// =============================================================================

pub struct ResendMailer {
    client: Resend,
}

impl ResendMailer {
    #[must_use]
    pub fn new(api_key: &str) -> Self {
        Self { client: Resend::new(api_key) }
    }
}

#[async_trait::async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let to = [email.to.as_str()];
        let options =
            CreateEmailBaseOptions::new(email.from.as_str(), to, email.subject.as_str()).with_html(&email.html);
        self.client
            .emails
            .send(options)
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "resend"
    }
}

/// Pick the delivery collaborator for this configuration.
#[must_use]
pub fn from_config(config: &SiteConfig) -> Arc<dyn Mailer> {
    match config.resend_api_key.as_deref() {
        Some(key) => Arc::new(ResendMailer::new(key)),
        None => Arc::new(LogMailer),
    }
}

#[cfg(test)]
#[path = "mailer_test.rs"]
mod tests;
