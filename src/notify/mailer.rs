//! Email composition and delivery.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::{BookAddedEvent, NotificationJob};
use crate::worker_pool::JobResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    /// The "new book in a category you follow" email.
    pub fn book_added(from: &str, to: &str, event: &BookAddedEvent) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject: format!("New {} book: {}", event.category, event.title),
            body: format!(
                "Hello,\n\n\
                 {author} has a new {category} book in the catalog: \"{title}\" ({year}).\n\n\
                 You are receiving this email because you subscribed to {category}.\n",
                author = event.author_name,
                category = event.category,
                title = event.title,
                year = event.year,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailError {
    #[error("recipient {recipient} rejected: {reason}")]
    Rejected { recipient: String, reason: String },

    #[error("mail transport unavailable: {0}")]
    Unavailable(String),
}

/// Delivers one email. Implementations talk to the (slow, external) mail
/// transport.
pub trait Mailer: Send + Sync {
    fn send(&self, email: &EmailMessage) -> Result<(), MailError>;
}

/// Mailer that only logs. Useful for development.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &EmailMessage) -> Result<(), MailError> {
        info!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }
}

/// Worker-pool handler that turns a [`NotificationJob`] into one email.
///
/// A failed send is logged with the recipient and reported to the pool as a
/// failed job; it never affects the other jobs of the batch.
pub fn email_job_handler(
    mailer: Arc<dyn Mailer>,
    sender_address: impl Into<String>,
) -> impl Fn(NotificationJob) -> JobResult + Send + Sync + 'static {
    let sender_address = sender_address.into();
    move |job: NotificationJob| {
        let email = EmailMessage::book_added(&sender_address, &job.recipient, &job.event);
        match mailer.send(&email) {
            Ok(()) => {
                debug!(
                    book_id = job.event.id,
                    recipient = %job.recipient,
                    "notification delivered"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    book_id = job.event.id,
                    recipient = %job.recipient,
                    error = %err,
                    "notification delivery failed"
                );
                Err(err.into())
            }
        }
    }
}
