//! Book-added notifications.
//!
//! The write path publishes a [`BookAddedEvent`] through the
//! [`EventProducer`] once the book is committed. A [`NotificationDispatcher`]
//! in the consumer group reads those events back, asks the
//! [`SubscriberLookup`] who follows the book's category and hands one
//! [`NotificationJob`] per recipient to the email [`WorkerPool`]. Delivery is
//! at least once: the offset is committed only after the whole batch has
//! been attempted.
//!
//! [`WorkerPool`]: crate::worker_pool::WorkerPool

mod dispatcher;
mod error;
mod event;
mod lookup;
mod mailer;
mod producer;
mod thread;

pub use dispatcher::{
    Cycle, DispatcherState, DispatcherStats, NotificationDispatcher, NotificationJob,
};
pub use error::DispatchError;
pub use event::{BookAddedEvent, BOOK_ADDED_TOPIC};
pub use lookup::{LookupError, StaticSubscribers, SubscriberLookup, TimedLookup};
pub use mailer::{email_job_handler, EmailMessage, LogMailer, MailError, Mailer};
pub use producer::EventProducer;
pub use thread::DispatcherThread;
