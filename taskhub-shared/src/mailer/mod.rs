/// Outbound email
///
/// Services hand fully rendered [`OutgoingEmail`]s to a [`Mailer`]. Mail
/// sent as a side effect of another write (welcome, invitation) goes through
/// [`spawn_detached`]: the request returns without waiting, and a delivery
/// failure only shows up in the logs.
///
/// # Implementations
///
/// - [`SmtpMailer`]: real delivery over SMTP (lettre)
/// - [`LogMailer`]: writes the message to the log; default when SMTP is not configured
/// - [`MemoryMailer`]: records messages in memory for tests
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::models::user::same_email;

mod smtp;
pub mod templates;

pub use smtp::SmtpMailer;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Invalid mail configuration: {0}")]
    InvalidConfig(String),
}

/// A rendered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// Sends in the background; the outcome is only logged
pub fn spawn_detached(mailer: Arc<dyn Mailer>, email: OutgoingEmail) {
    tokio::spawn(async move {
        let to = email.to.clone();
        let subject = email.subject.clone();

        match mailer.send(email).await {
            Ok(()) => tracing::debug!(%to, %subject, "Email sent"),
            Err(e) => tracing::warn!(%to, %subject, error = %e, "Email delivery failed"),
        }
    });
}

/// Logs messages instead of sending them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.text,
            "SMTP not configured; email logged instead of sent"
        );
        Ok(())
    }
}

/// Keeps every message in memory
///
/// `failing()` builds one that rejects every send, to check that delivery
/// errors never reach the caller.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Messages accepted so far, in send order
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<OutgoingEmail> {
        self.sent()
            .into_iter()
            .filter(|m| same_email(&m.to, address))
            .collect()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::SendFailed("memory mailer set to fail".to_string()));
        }

        self.sent.lock().unwrap_or_else(|e| e.into_inner()).push(email);
        Ok(())
    }
}

/// SMTP settings
#[derive(Clone)]
pub struct MailerConfig {
    /// `None` selects [`LogMailer`]
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    /// STARTTLS (or implicit TLS on 465); `false` for local relays
    pub smtp_tls: bool,
    pub from_address: String,
    pub from_name: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_tls: true,
            from_address: "noreply@taskhub.local".to_string(),
            from_name: "TaskHub".to_string(),
        }
    }
}

impl std::fmt::Debug for MailerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailerConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| "[REDACTED]"))
            .field("smtp_tls", &self.smtp_tls)
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .finish()
    }
}

impl MailerConfig {
    /// Reads `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`,
    /// `SMTP_TLS`, `EMAIL_FROM` and `EMAIL_FROM_NAME`
    pub fn from_env() -> Result<Self, MailError> {
        let defaults = Self::default();
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let smtp_port = match var("SMTP_PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| MailError::InvalidConfig(format!("Invalid SMTP_PORT: {}", port)))?,
            None => defaults.smtp_port,
        };

        let smtp_tls = match var("SMTP_TLS") {
            Some(flag) => flag
                .parse()
                .map_err(|_| MailError::InvalidConfig(format!("Invalid SMTP_TLS: {}", flag)))?,
            None => defaults.smtp_tls,
        };

        Ok(Self {
            smtp_host: var("SMTP_HOST"),
            smtp_port,
            smtp_username: var("SMTP_USERNAME"),
            smtp_password: var("SMTP_PASSWORD"),
            smtp_tls,
            from_address: var("EMAIL_FROM").unwrap_or(defaults.from_address),
            from_name: var("EMAIL_FROM_NAME").unwrap_or(defaults.from_name),
        })
    }
}

/// Picks the mailer implementation for a configuration
pub fn build_mailer(config: &MailerConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match &config.smtp_host {
        Some(_) => Ok(Arc::new(SmtpMailer::new(config)?)),
        None => {
            tracing::warn!("SMTP_HOST not set; outgoing email will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}
