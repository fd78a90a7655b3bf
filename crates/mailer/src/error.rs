use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("Email API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Email API returned an error: {0}")]
    ApiError(String),

    #[error("Mailer is not configured. Missing API key or sender.")]
    NotConfigured,

    #[error("The mail queue is full.")]
    QueueFull,

    #[error("The mail queue is closed.")]
    QueueClosed,
}
