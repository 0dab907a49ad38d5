//! Alert delivery.
//!
//! [`Notifier`] is the seam between the monitor and a delivery channel.
//! [`SmtpNotifier`] sends plain-text email over STARTTLS; [`LogNotifier`]
//! only writes the alert to the log and is used when no SMTP credentials are
//! configured.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

const SMTP_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("SMTP_USER / SMTP_PASS not set")]
    MissingCredentials,
    #[error("no recipients configured")]
    NoRecipients,
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// SMTP relay settings.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl SmtpSettings {
    pub fn has_credentials(&self) -> bool {
        !self.user.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A channel that can deliver a subject and a plain-text body.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;

    /// Short name of the channel for logs and endpoint responses.
    fn channel(&self) -> &'static str;
}

/// Sends email through an SMTP relay with STARTTLS.
pub struct SmtpNotifier {
    settings: SmtpSettings,
    recipients: Vec<String>,
}

impl SmtpNotifier {
    pub fn new(settings: SmtpSettings, recipients: Vec<String>) -> Self {
        Self {
            settings,
            recipients,
        }
    }

    fn build_message(&self, subject: &str, body: &str) -> Result<Message, NotifyError> {
        if !self.settings.has_credentials() {
            return Err(NotifyError::MissingCredentials);
        }
        if self.recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }
        let from: Mailbox = self.settings.user.parse()?;
        let mut builder = Message::builder()
            .from(from)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.recipients {
            builder = builder.to(recipient.parse()?);
        }
        Ok(builder.body(body.to_string())?)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = self.build_message(subject, body)?;
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.settings.server)?
            .port(self.settings.port)
            .credentials(Credentials::new(
                self.settings.user.clone(),
                self.settings.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();
        mailer.send(message).await?;
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "smtp"
    }
}

/// Writes alerts to the log instead of delivering them.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        tracing::info!("ALERT [{}]\n{}", subject, body);
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "log"
    }
}

/// Picks SMTP when credentials are configured, the log otherwise.
pub fn notifier_for(smtp: &SmtpSettings, recipients: &[String]) -> Arc<dyn Notifier> {
    if smtp.has_credentials() {
        Arc::new(SmtpNotifier::new(smtp.clone(), recipients.to_vec()))
    } else {
        tracing::warn!("SMTP credentials not set; alerts will only be logged");
        Arc::new(LogNotifier)
    }
}

/// Formats seat and error alerts and honors the alert on/off switch.
#[derive(Clone)]
pub struct Alerter {
    notifier: Arc<dyn Notifier>,
    enabled: bool,
    level: String,
    url: String,
}

impl Alerter {
    pub fn new(notifier: Arc<dyn Notifier>, enabled: bool, level: &str, url: &str) -> Self {
        Self {
            notifier,
            enabled,
            level: level.to_string(),
            url: url.to_string(),
        }
    }

    pub fn channel(&self) -> &'static str {
        self.notifier.channel()
    }

    /// Sends an alert unless alerts are disabled. Delivery failures are
    /// logged, not returned.
    pub async fn send_alert(&self, msg: &str, subject_override: Option<&str>) {
        if !self.enabled {
            tracing::info!("EMAIL_ALERT=false; skipping alert");
            return;
        }
        let subject = subject_override
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} Seat Alert!", self.level));
        let body = format!("Schedule update:\n\n{}\n\nCheck: {}", msg, self.url);
        match self.notifier.send(&subject, &body).await {
            Ok(()) => tracing::info!("alert sent via {}", self.notifier.channel()),
            Err(e) => tracing::warn!("alert via {} failed: {}", self.notifier.channel(), e),
        }
    }

    /// Sends a message regardless of the alert switch. Used by the
    /// on-demand endpoints.
    pub async fn send_plain(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.notifier.send(subject, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Notifier for Recording {
        async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
            self.sent
                .lock()
                .unwrap()
                .push((subject.to_string(), body.to_string()));
            Ok(())
        }

        fn channel(&self) -> &'static str {
            "recording"
        }
    }

    fn settings(user: &str, password: &str) -> SmtpSettings {
        SmtpSettings {
            server: "smtp.example.com".to_string(),
            port: 587,
            user: user.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn seat_alert_uses_level_subject_and_url_footer() {
        let recording = Arc::new(Recording::default());
        let alerter = Alerter::new(recording.clone(), true, "Level 04", "https://example.ca/schedule");

        alerter.send_alert("OPEN for target intake(s)", None).await;

        let sent = recording.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "Level 04 Seat Alert!");
        assert!(sent[0].1.contains("OPEN for target intake(s)"));
        assert!(sent[0].1.ends_with("Check: https://example.ca/schedule"));
    }

    #[tokio::test]
    async fn disabled_alerts_are_skipped_but_plain_sends() {
        let recording = Arc::new(Recording::default());
        let alerter = Alerter::new(recording.clone(), false, "Level 04", "https://example.ca");

        alerter.send_alert("ignored", Some("custom")).await;
        alerter.send_plain("SMTP Test", "hello").await.unwrap();

        let sent = recording.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "SMTP Test");
    }

    #[tokio::test]
    async fn smtp_without_credentials_fails_fast() {
        let notifier = SmtpNotifier::new(settings("", ""), vec!["a@example.com".to_string()]);
        let err = notifier.send("subject", "body").await.unwrap_err();
        assert!(matches!(err, NotifyError::MissingCredentials));
        assert_eq!(err.to_string(), "SMTP_USER / SMTP_PASS not set");
    }

    #[test]
    fn smtp_requires_recipients() {
        let notifier = SmtpNotifier::new(settings("monitor@example.com", "pw"), vec![]);
        assert!(matches!(
            notifier.build_message("s", "b"),
            Err(NotifyError::NoRecipients)
        ));
    }

    #[test]
    fn smtp_rejects_bad_address() {
        let notifier = SmtpNotifier::new(
            settings("monitor@example.com", "pw"),
            vec!["not an address".to_string()],
        );
        assert!(matches!(
            notifier.build_message("s", "b"),
            Err(NotifyError::Address(_))
        ));
    }

    #[test]
    fn smtp_builds_plain_text_message() {
        let notifier = SmtpNotifier::new(
            settings("monitor@example.com", "pw"),
            vec!["a@example.com".to_string(), "b@example.com".to_string()],
        );
        let message = notifier.build_message("Level 04 Seat Alert!", "seats").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Level 04 Seat Alert!"));
        assert!(raw.contains("a@example.com"));
        assert!(raw.contains("b@example.com"));
    }

    #[test]
    fn notifier_selection_follows_credentials() {
        assert_eq!(notifier_for(&settings("", ""), &[]).channel(), "log");
        assert_eq!(
            notifier_for(&settings("monitor@example.com", "pw"), &[]).channel(),
            "smtp"
        );
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", settings("monitor@example.com", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
