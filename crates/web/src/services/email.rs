//! Summary mail sent to the persona owner once a conversation runs long.
//!
//! Uses SMTP via lettre with an Askama plain-text template.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;

use crate::config::EmailConfig;

/// Plain text template for the summary mail.
#[derive(Template)]
#[template(path = "email/summary.txt")]
struct SummaryEmailText<'a> {
    nickname: &'a str,
    summary: &'a str,
    transcript: &'a str,
    booking_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Contents of one summary mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryMail {
    pub nickname: String,
    pub summary: String,
    pub transcript: String,
    pub booking_url: Option<String>,
}

impl SummaryMail {
    /// Mail subject line.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("[{}] 会話要約＋ご予約のご案内", self.nickname)
    }

    /// Plain-text body.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render.
    pub fn body(&self) -> Result<String, askama::Error> {
        SummaryEmailText {
            nickname: &self.nickname,
            summary: &self.summary,
            transcript: &self.transcript,
            booking_url: self.booking_url.as_deref().unwrap_or("（未設定）"),
        }
        .render()
    }
}

/// Something that can deliver a [`SummaryMail`].
#[async_trait]
pub trait SummaryMailer: Send + Sync {
    /// Deliver `mail` to the configured recipient.
    ///
    /// # Errors
    ///
    /// Returns error if the mail cannot be rendered or delivered.
    async fn send_summary(&self, mail: &SummaryMail) -> Result<(), EmailError>;
}

/// SMTP mailer.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipient: Mailbox,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// Connects with implicit TLS, as Gmail expects on port 465.
    ///
    /// # Errors
    ///
    /// Returns error if an address is invalid or the relay cannot be set up.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let from = parse_mailbox(&config.from_address)?;
        let recipient = parse_mailbox(&config.recipient)?;

        let credentials = Credentials::new(
            config.from_address.clone(),
            config.app_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from,
            recipient,
        })
    }
}

#[async_trait]
impl SummaryMailer for EmailService {
    #[instrument(skip(self, mail), fields(nickname = %mail.nickname))]
    async fn send_summary(&self, mail: &SummaryMail) -> Result<(), EmailError> {
        let subject = mail.subject();
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.recipient.clone())
            .subject(subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body()?)?;

        self.mailer.send(email).await?;

        tracing::info!(to = %self.recipient, subject = %subject, "Summary mail sent");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))
}
