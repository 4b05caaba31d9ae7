use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use library_catalog::cache::{CacheError, CacheStore, HllUpdate, InMemoryCacheStore};
use library_catalog::catalog::{
    AddedBook, Author, Book, BookId, CatalogStore, InMemoryCatalogStore, NewBook, StoreError,
};
use library_catalog::notify::{EmailMessage, LookupError, MailError, Mailer, SubscriberLookup};

// ============================================================================
// Cache
// ============================================================================

/// Cache that can be switched into a failing state.
#[derive(Clone, Default)]
pub struct FlakyCache {
    inner: InMemoryCacheStore,
    down: Arc<AtomicBool>,
}

impl FlakyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryCacheStore {
        &self.inner
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.down.load(Ordering::SeqCst) {
            Err(CacheError::Unavailable("connection reset".into()))
        } else {
            Ok(())
        }
    }
}

impl CacheStore for FlakyCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.check()?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.check()?;
        self.inner.set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.check()?;
        self.inner.delete(key)
    }

    fn list_replace(
        &self,
        key: &str,
        values: &[String],
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.check()?;
        self.inner.list_replace(key, values, ttl)
    }

    fn list_range(&self, key: &str) -> Result<Vec<String>, CacheError> {
        self.check()?;
        self.inner.list_range(key)
    }

    fn hll_add_delta(&self, key: &str, member: &str) -> Result<HllUpdate, CacheError> {
        self.check()?;
        self.inner.hll_add_delta(key, member)
    }

    fn hll_count(&self, key: &str) -> Result<u64, CacheError> {
        self.check()?;
        self.inner.hll_count(key)
    }

    fn zincr_by(&self, key: &str, member: &str, delta: i64) -> Result<i64, CacheError> {
        self.check()?;
        self.inner.zincr_by(key, member, delta)
    }

    fn zscore(&self, key: &str, member: &str) -> Result<Option<i64>, CacheError> {
        self.check()?;
        self.inner.zscore(key, member)
    }

    fn zrev_range(&self, key: &str, limit: usize) -> Result<Vec<(String, i64)>, CacheError> {
        self.check()?;
        self.inner.zrev_range(key, limit)
    }
}

// ============================================================================
// Store
// ============================================================================

/// Store that counts the collection reads cache-aside falls back to.
#[derive(Clone, Default)]
pub struct CountingStore {
    inner: InMemoryCatalogStore,
    category_reads: Arc<AtomicUsize>,
    new_book_reads: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category_reads(&self) -> usize {
        self.category_reads.load(Ordering::SeqCst)
    }

    pub fn new_book_reads(&self) -> usize {
        self.new_book_reads.load(Ordering::SeqCst)
    }
}

impl CatalogStore for CountingStore {
    fn add_author(&self, name: &str) -> Result<Author, StoreError> {
        self.inner.add_author(name)
    }

    fn add_book(&self, book: NewBook) -> Result<AddedBook, StoreError> {
        self.inner.add_book(book)
    }

    fn book(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        self.inner.book(id)
    }

    fn books_by_ids(&self, ids: &[BookId]) -> Result<Vec<Book>, StoreError> {
        self.inner.books_by_ids(ids)
    }

    fn categories(&self) -> Result<Vec<String>, StoreError> {
        self.category_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.categories()
    }

    fn new_books(&self, limit: usize) -> Result<Vec<Book>, StoreError> {
        self.new_book_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.new_books(limit)
    }
}

// ============================================================================
// Mail
// ============================================================================

/// Mailer that records every attempt and fails or panics for chosen
/// recipients.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    attempts: Arc<Mutex<Vec<EmailMessage>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    panicking: Arc<Mutex<HashSet<String>>>,
    delay: Option<Duration>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every send.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_for(&self, recipient: &str) {
        self.failing.lock().unwrap().insert(recipient.to_string());
    }

    pub fn panic_for(&self, recipient: &str) {
        self.panicking.lock().unwrap().insert(recipient.to_string());
    }

    pub fn attempts(&self) -> Vec<EmailMessage> {
        self.attempts.lock().unwrap().clone()
    }

    /// Recipients of every attempt, sorted.
    pub fn recipients(&self) -> Vec<String> {
        let mut recipients: Vec<_> = self.attempts().into_iter().map(|email| email.to).collect();
        recipients.sort();
        recipients
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, email: &EmailMessage) -> Result<(), MailError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.attempts.lock().unwrap().push(email.clone());
        if self.panicking.lock().unwrap().contains(&email.to) {
            panic!("mail transport crashed sending to {}", email.to);
        }
        if self.failing.lock().unwrap().contains(&email.to) {
            return Err(MailError::Rejected {
                recipient: email.to.clone(),
                reason: "mailbox full".into(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Subscriber lookup
// ============================================================================

/// Lookup that fails until `recover` is called, then answers from a table.
#[derive(Clone)]
pub struct OutageLookup {
    subscribers: Vec<String>,
    down: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl OutageLookup {
    pub fn down(subscribers: &[&str]) -> Self {
        Self {
            subscribers: subscribers.iter().map(|s| s.to_string()).collect(),
            down: Arc::new(AtomicBool::new(true)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn recover(&self) {
        self.down.store(false, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SubscriberLookup for OutageLookup {
    fn subscribers_for(&self, _category: &str) -> Result<Vec<String>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(LookupError::Unavailable("subscriber service down".into()));
        }
        Ok(self.subscribers.clone())
    }
}

/// Lookup that never answers within any reasonable deadline.
pub struct HangingLookup(pub Duration);

impl SubscriberLookup for HangingLookup {
    fn subscribers_for(&self, _category: &str) -> Result<Vec<String>, LookupError> {
        std::thread::sleep(self.0);
        Ok(vec!["late@x.com".into()])
    }
}
