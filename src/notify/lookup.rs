//! Subscriber lookup - the collaborator that knows who follows a category.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError, SendTimeoutError, Sender};
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::normalize_category;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("subscriber lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("subscriber service unavailable: {0}")]
    Unavailable(String),
}

/// Resolves the email addresses subscribed to a category.
pub trait SubscriberLookup: Send + Sync {
    fn subscribers_for(&self, category: &str) -> Result<Vec<String>, LookupError>;
}

/// Bounds another lookup by a deadline.
///
/// Inner calls run one at a time on a single helper thread, started on first
/// use. A caller waits for the helper to take its request and then for the
/// answer, both within one deadline. A helper still stuck on an earlier call
/// makes later callers time out instead of piling up more threads. Late
/// answers go to a reply channel nobody listens on anymore.
pub struct TimedLookup {
    inner: Arc<dyn SubscriberLookup>,
    timeout: Duration,
    helper: Mutex<Option<Sender<Request>>>,
}

struct Request {
    category: String,
    reply: Sender<Result<Vec<String>, LookupError>>,
}

impl TimedLookup {
    pub fn new(inner: Arc<dyn SubscriberLookup>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            helper: Mutex::new(None),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn helper(&self) -> Result<Sender<Request>, LookupError> {
        let mut slot = self
            .helper
            .lock()
            .map_err(|_| LookupError::Unavailable("lookup helper lock poisoned".into()))?;
        if let Some(requests) = slot.as_ref() {
            return Ok(requests.clone());
        }

        // Rendezvous: a send only completes once the helper is free.
        let (requests, incoming) = channel::bounded::<Request>(0);
        let inner = Arc::clone(&self.inner);
        thread::Builder::new()
            .name("subscriber-lookup".into())
            .spawn(move || {
                for request in incoming {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        inner.subscribers_for(&request.category)
                    }))
                    .unwrap_or_else(|_| {
                        Err(LookupError::Unavailable("subscriber lookup panicked".into()))
                    });
                    // The caller is gone if it already timed out.
                    let _ = request.reply.send(result);
                }
                debug!("subscriber lookup helper exiting");
            })
            .map_err(|err| LookupError::Unavailable(err.to_string()))?;

        *slot = Some(requests.clone());
        Ok(requests)
    }

    fn forget_helper(&self) {
        if let Ok(mut slot) = self.helper.lock() {
            *slot = None;
        }
    }
}

impl SubscriberLookup for TimedLookup {
    fn subscribers_for(&self, category: &str) -> Result<Vec<String>, LookupError> {
        let deadline = Instant::now() + self.timeout;
        let requests = self.helper()?;
        let (reply, answer) = channel::bounded(1);
        let request = Request {
            category: category.to_string(),
            reply,
        };

        match requests.send_deadline(request, deadline) {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => {
                warn!(category, "subscriber lookup helper still busy");
                return Err(LookupError::Timeout(self.timeout));
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                self.forget_helper();
                return Err(LookupError::Unavailable("lookup helper exited".into()));
            }
        }

        match answer.recv_deadline(deadline) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(LookupError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                self.forget_helper();
                Err(LookupError::Unavailable(
                    "lookup helper exited without answering".into(),
                ))
            }
        }
    }
}

/// Fixed category → subscribers table.
///
/// Categories are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StaticSubscribers {
    by_category: HashMap<String, Vec<String>>,
}

impl StaticSubscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(mut self, category: &str, email: impl Into<String>) -> Self {
        self.by_category
            .entry(normalize_category(category))
            .or_default()
            .push(email.into());
        self
    }
}

impl SubscriberLookup for StaticSubscribers {
    fn subscribers_for(&self, category: &str) -> Result<Vec<String>, LookupError> {
        Ok(self
            .by_category
            .get(&normalize_category(category))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct SlowLookup(Duration);

    impl SubscriberLookup for SlowLookup {
        fn subscribers_for(&self, _category: &str) -> Result<Vec<String>, LookupError> {
            thread::sleep(self.0);
            Ok(vec!["late@x.com".into()])
        }
    }

    /// Hangs on its first call only, then answers at once.
    struct StuckOnce {
        calls: AtomicUsize,
        hang: Duration,
    }

    impl SubscriberLookup for StuckOnce {
        fn subscribers_for(&self, category: &str) -> Result<Vec<String>, LookupError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                thread::sleep(self.hang);
                return Ok(vec!["stale@x.com".into()]);
            }
            Ok(vec![format!("{}@x.com", category)])
        }
    }

    struct Exploding;

    impl SubscriberLookup for Exploding {
        fn subscribers_for(&self, category: &str) -> Result<Vec<String>, LookupError> {
            if category == "boom" {
                panic!("lookup backend crashed");
            }
            Ok(vec!["a@x.com".into()])
        }
    }

    #[test]
    fn static_subscribers_match_case_insensitively() {
        let lookup = StaticSubscribers::new()
            .subscribe("Sci-Fi", "a@x.com")
            .subscribe("sci-fi", "b@x.com");

        assert_eq!(
            lookup.subscribers_for("SCI-FI").unwrap(),
            vec!["a@x.com", "b@x.com"]
        );
        assert!(lookup.subscribers_for("poetry").unwrap().is_empty());
    }

    #[test]
    fn timed_lookup_passes_fast_answers_through() {
        let inner = Arc::new(StaticSubscribers::new().subscribe("poetry", "a@x.com"));
        let lookup = TimedLookup::new(inner, Duration::from_millis(500));
        assert_eq!(lookup.subscribers_for("poetry").unwrap(), vec!["a@x.com"]);
    }

    #[test]
    fn timed_lookup_gives_up_after_deadline() {
        let lookup = TimedLookup::new(
            Arc::new(SlowLookup(Duration::from_millis(300))),
            Duration::from_millis(20),
        );
        assert_eq!(
            lookup.subscribers_for("poetry"),
            Err(LookupError::Timeout(Duration::from_millis(20)))
        );
    }

    #[test]
    fn timeouts_do_not_start_more_inner_calls() {
        let inner = Arc::new(StuckOnce {
            calls: AtomicUsize::new(0),
            hang: Duration::from_millis(400),
        });
        let lookup = TimedLookup::new(inner.clone(), Duration::from_millis(20));

        for _ in 0..5 {
            assert_eq!(
                lookup.subscribers_for("poetry"),
                Err(LookupError::Timeout(Duration::from_millis(20)))
            );
        }
        // Only the stuck call ever reached the inner lookup.
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        thread::sleep(Duration::from_millis(500));
        // The helper is free again, and the stale answer is not handed out.
        assert_eq!(lookup.subscribers_for("poetry").unwrap(), vec!["poetry@x.com"]);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn panicking_lookup_keeps_the_helper_alive() {
        let lookup = TimedLookup::new(Arc::new(Exploding), Duration::from_millis(500));

        assert!(matches!(
            lookup.subscribers_for("boom"),
            Err(LookupError::Unavailable(_))
        ));
        assert_eq!(lookup.subscribers_for("poetry").unwrap(), vec!["a@x.com"]);
    }
}
