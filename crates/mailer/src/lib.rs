use crate::error::MailerError;
use async_trait::async_trait;
use configuration::MailSettings;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

pub mod error;
pub mod templates;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A rendered email, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

impl Email {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, html: String) -> Self {
        Self {
            to: vec![to.into()],
            subject: subject.into(),
            html,
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailerError>;
}

/// The JSON payload for the `POST /emails` endpoint.
#[derive(Debug, Serialize)]
struct SendEmailPayload<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

/// Sends through the Resend transactional email API.
pub struct ResendMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(settings: &MailSettings) -> Result<Self, MailerError> {
        if settings.api_key.trim().is_empty() || settings.from.trim().is_empty() {
            return Err(MailerError::NotConfigured);
        }
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.trim().to_string(),
            from: settings.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        let url = format!("{}/emails", self.api_url);

        let payload = SendEmailPayload {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to decode error response".to_string());
            return Err(MailerError::ApiError(format!("{status}: {error_text}")));
        }

        Ok(())
    }
}

/// Logs emails instead of sending them. Used when no API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        tracing::info!(to = ?email.to, subject = %email.subject, "Email not sent, mailer is not configured.");
        Ok(())
    }
}

/// Picks the Resend mailer when configured and the logging one otherwise.
pub fn build_mailer(settings: &MailSettings) -> Arc<dyn Mailer> {
    match ResendMailer::new(settings) {
        Ok(mailer) => Arc::new(mailer),
        Err(_) => {
            tracing::warn!("Mailer is not configured (missing API key or sender). Emails will only be logged.");
            Arc::new(LogMailer)
        }
    }
}

/// Queue for notifications that should not hold up the request that caused them.
#[derive(Clone)]
pub struct MailQueue {
    tx: mpsc::Sender<Email>,
}

impl MailQueue {
    /// Creates the queue and the receiver to hand to [`run_mail_service`].
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Email>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Hands `email` to the mail service without waiting. A full queue drops
    /// the email.
    pub fn enqueue(&self, email: Email) -> Result<(), MailerError> {
        self.tx.try_send(email).map_err(|e| match e {
            TrySendError::Full(email) => {
                tracing::warn!(subject = %email.subject, "Mail queue is full, dropping email.");
                MailerError::QueueFull
            }
            TrySendError::Closed(_) => MailerError::QueueClosed,
        })
    }
}

/// A long-running service that sends every queued email. Failures are logged
/// and do not stop the service; it ends when all queue handles are dropped.
pub async fn run_mail_service(mailer: Arc<dyn Mailer>, mut rx: mpsc::Receiver<Email>) {
    tracing::info!("Mail service started.");

    while let Some(email) = rx.recv().await {
        if let Err(e) = mailer.send(&email).await {
            tracing::error!(error = ?e, subject = %email.subject, "Failed to send email.");
        }
    }

    tracing::info!("Mail queue closed. Mail service shutting down.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<Email>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &Email) -> Result<(), MailerError> {
            if email.to.iter().any(|to| to.ends_with("@invalid")) {
                return Err(MailerError::ApiError("rejected".to_string()));
            }
            self.sent.lock().await.push(email.clone());
            Ok(())
        }
    }

    #[test]
    fn resend_requires_a_key() {
        let settings = MailSettings::default();
        assert!(matches!(ResendMailer::new(&settings), Err(MailerError::NotConfigured)));

        let settings = MailSettings {
            api_key: "re_123".to_string(),
            ..MailSettings::default()
        };
        assert!(ResendMailer::new(&settings).is_ok());
    }

    #[tokio::test]
    async fn mail_service_sends_queued_mail_and_survives_failures() {
        let mailer = Arc::new(RecordingMailer::default());
        let (queue, rx) = MailQueue::channel(8);
        let service = tokio::spawn(run_mail_service(mailer.clone(), rx));

        queue.enqueue(Email::new("a@example.com", "One", "<p>1</p>".to_string())).unwrap();
        queue.enqueue(Email::new("b@invalid", "Two", "<p>2</p>".to_string())).unwrap();
        queue.enqueue(Email::new("c@example.com", "Three", "<p>3</p>".to_string())).unwrap();
        drop(queue);
        service.await.unwrap();

        let subjects: Vec<String> = mailer.sent.lock().await.iter().map(|e| e.subject.clone()).collect();
        assert_eq!(subjects, vec!["One".to_string(), "Three".to_string()]);
    }

    #[tokio::test]
    async fn enqueue_fails_once_the_service_is_gone() {
        let (queue, rx) = MailQueue::channel(1);
        drop(rx);
        let result = queue.enqueue(Email::new("a@example.com", "x", String::new()));
        assert!(matches!(result, Err(MailerError::QueueClosed)));
    }

    #[tokio::test]
    async fn a_full_queue_drops_instead_of_waiting() {
        let (queue, mut rx) = MailQueue::channel(1);
        queue.enqueue(Email::new("a@example.com", "One", String::new())).unwrap();

        let second = queue.enqueue(Email::new("b@example.com", "Two", String::new()));
        assert!(matches!(second, Err(MailerError::QueueFull)));

        assert_eq!(rx.recv().await.map(|e| e.subject), Some("One".to_string()));
        assert!(rx.try_recv().is_err());
    }
}
