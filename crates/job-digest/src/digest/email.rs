//! Digest delivery over SMTP.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::generator::{Digest, DigestGenerator};
use crate::config::{DigestConfig, SmtpSettings};
use crate::error::MailError;

/// Delivers a rendered digest to its recipient.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Mailer name for logging.
    fn name(&self) -> &'static str;

    /// Send one digest. `Ok` means the server accepted the message.
    async fn send(&self, subject: &str, digest: &Digest) -> Result<(), MailError>;
}

/// SMTP mailer using STARTTLS and password auth.
pub struct SmtpMailer {
    smtp: SmtpSettings,
    recipient: String,
}

impl SmtpMailer {
    #[must_use]
    pub fn new(config: &DigestConfig) -> Self {
        Self {
            smtp: config.smtp.clone(),
            recipient: config.recipient.clone(),
        }
    }

    /// Read the SMTP password from the configured environment variable.
    fn password(&self) -> Result<String, MailError> {
        std::env::var(&self.smtp.password_env_var)
            .ok()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| MailError::MissingCredential {
                var: self.smtp.password_env_var.clone(),
            })
    }

    /// Build a multipart message with HTML and plain-text content.
    pub fn build_message(&self, subject: &str, digest: &Digest) -> Result<Message, MailError> {
        let from = parse_mailbox(&self.smtp.sender)?;
        let to = parse_mailbox(&self.recipient)?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(digest.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(digest.html.clone()),
                    ),
            )?;

        Ok(message)
    }

    /// Send a fixed test email to verify configuration.
    pub async fn send_test(&self) -> Result<(), MailError> {
        self.send("job-digest - Test Email", &DigestGenerator::test_digest())
            .await
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, subject: &str, digest: &Digest) -> Result<(), MailError> {
        // Checked first so a missing secret never opens a connection.
        let password = self.password()?;
        let email = self.build_message(subject, digest)?;

        let creds = Credentials::new(self.smtp.username.clone(), password);

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp.host)?
                .port(self.smtp.port)
                .credentials(creds)
                .build();

        mailer.send(email).await?;

        tracing::info!(
            to = %self.recipient,
            subject = subject,
            listings = digest.listing_count,
            "Email sent successfully"
        );

        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse()
        .map_err(|source| MailError::InvalidAddress {
            address: address.to_string(),
            source,
        })
}
