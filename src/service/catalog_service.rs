//! The catalog facade used by request handlers.

use std::sync::Arc;

use tracing::{error, warn};

use super::CatalogError;
use crate::bus::Publisher;
use crate::cache::CacheStore;
use crate::cache_aside::{
    BackgroundTasks, CacheAside, CategoriesCache, CategoriesCollection, NewBooksCache,
    NewBooksCollection,
};
use crate::catalog::{Book, BookId, CatalogStore, NewBook};
use crate::config::CacheConfig;
use crate::notify::{BookAddedEvent, EventProducer};
use crate::views::{PopularityRanker, UserId, ViewCounter};

/// Ties the store, the cache-backed read models and the event producer
/// together.
///
/// Writes go to the store first; the `book-added` event is published only
/// after the store has accepted the book. Reads that depend on the cache
/// degrade to the store (collections) or to zero/empty (views, popularity)
/// when the cache misbehaves.
pub struct CatalogService<P> {
    store: Arc<dyn CatalogStore>,
    producer: EventProducer<P>,
    views: ViewCounter,
    ranker: PopularityRanker,
    categories: CategoriesCache,
    new_books: NewBooksCache,
    popular_limit: usize,
}

impl<P: Publisher> CatalogService<P> {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<dyn CacheStore>,
        producer: EventProducer<P>,
        background: Arc<BackgroundTasks>,
        config: &CacheConfig,
    ) -> Self {
        let ranker = PopularityRanker::new(Arc::clone(&cache));
        let views = ViewCounter::new(Arc::clone(&cache), ranker.clone());
        let categories = CacheAside::new(
            CategoriesCollection,
            Arc::clone(&store),
            Arc::clone(&cache),
            config.collection_ttl(),
            Arc::clone(&background),
        );
        let new_books = CacheAside::new(
            NewBooksCollection::new(config.new_books_limit),
            Arc::clone(&store),
            cache,
            config.collection_ttl(),
            background,
        );

        Self {
            store,
            producer,
            views,
            ranker,
            categories,
            new_books,
            popular_limit: config.popular_limit,
        }
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    pub fn producer(&self) -> &EventProducer<P> {
        &self.producer
    }

    pub fn views(&self) -> &ViewCounter {
        &self.views
    }

    pub fn ranker(&self) -> &PopularityRanker {
        &self.ranker
    }

    /// Store a new book and announce it.
    ///
    /// A store error is returned with nothing written. Once the store has
    /// accepted the book the call succeeds even if publishing the event
    /// fails; that failure is only logged.
    pub fn add_book(&self, book: NewBook) -> Result<Book, CatalogError> {
        let added = self.store.add_book(book)?;

        let event = BookAddedEvent::from(&added);
        if let Err(err) = self.producer.publish(&event) {
            error!(
                book_id = event.id,
                category = %event.category,
                error = %err,
                "book stored but book-added event was not published"
            );
        }

        Ok(added.book)
    }

    /// Fetch a book and count the view. `None` for unknown ids, in which
    /// case no view is recorded.
    pub fn view_book(
        &self,
        book_id: BookId,
        user_id: UserId,
    ) -> Result<Option<Book>, CatalogError> {
        let book = self.store.book(book_id)?;
        if book.is_some() {
            if let Err(err) = self.views.register_view(book_id, user_id) {
                warn!(book_id, user_id, error = %err, "failed to register view");
            }
        }
        Ok(book)
    }

    /// Distinct viewers of a book; 0 when the cache cannot answer.
    pub fn book_views_count(&self, book_id: BookId) -> u64 {
        self.views.view_count(book_id).unwrap_or_else(|err| {
            warn!(book_id, error = %err, "view count unavailable");
            0
        })
    }

    /// Most viewed books, best first. Empty when the ranking is empty or
    /// the cache cannot answer.
    pub fn popular_books(&self) -> Result<Vec<Book>, CatalogError> {
        let ids = match self.ranker.top_n(self.popular_limit) {
            Ok(ids) => ids,
            Err(err) => {
                warn!(error = %err, "popularity ranking unavailable");
                return Ok(Vec::new());
            }
        };
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.store.books_by_ids(&ids)?)
    }

    pub fn categories(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.categories.get()?.items)
    }

    pub fn new_books(&self) -> Result<Vec<Book>, CatalogError> {
        Ok(self.new_books.get()?.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusError, InMemoryLog, Message};
    use crate::cache::InMemoryCacheStore;
    use crate::catalog::{InMemoryCatalogStore, StoreError};
    use crate::notify::BOOK_ADDED_TOPIC;
    use crate::shutdown::Shutdown;
    use crate::worker_pool::PoolSettings;

    struct RejectingPublisher;

    impl Publisher for RejectingPublisher {
        fn publish(&self, _message: Message) -> Result<(), BusError> {
            Err(BusError::ConnectionFailed("broker down".into()))
        }
    }

    fn service_with<P: Publisher>(
        publisher: P,
    ) -> (CatalogService<P>, InMemoryCatalogStore, u64) {
        let store = InMemoryCatalogStore::new();
        let author = store.add_author("Ann").unwrap();
        let background = Arc::new(
            BackgroundTasks::start(
                PoolSettings {
                    workers: 1,
                    queue_depth: 8,
                },
                Shutdown::new(),
            )
            .unwrap(),
        );
        let service = CatalogService::new(
            Arc::new(store.clone()),
            Arc::new(InMemoryCacheStore::new()),
            EventProducer::new(publisher),
            background,
            &CacheConfig::default(),
        );
        (service, store, author.id)
    }

    #[test]
    fn add_book_publishes_after_store_write() {
        let log = InMemoryLog::new();
        let (service, store, author) = service_with(log.clone());

        let book = service
            .add_book(NewBook::new(author, "X", 2001, "Sci-Fi"))
            .unwrap();
        assert_eq!(book.category, "sci-fi");
        assert_eq!(store.book(book.id).unwrap(), Some(book.clone()));

        let messages = log.messages(BOOK_ADDED_TOPIC);
        assert_eq!(messages.len(), 1);
        let event: BookAddedEvent = messages[0].decode_json().unwrap();
        assert_eq!(event.id, book.id);
        assert_eq!(event.category, "sci-fi");
        assert_eq!(event.author_name, "Ann");
    }

    #[test]
    fn store_rejection_publishes_nothing() {
        let log = InMemoryLog::new();
        let (service, _, _) = service_with(log.clone());

        let err = service
            .add_book(NewBook::new(99, "X", 2001, "poetry"))
            .unwrap_err();
        assert_eq!(err, CatalogError::Store(StoreError::UnknownAuthor(99)));
        assert_eq!(log.len(BOOK_ADDED_TOPIC), 0);
    }

    #[test]
    fn publish_failure_keeps_the_book() {
        let (service, store, author) = service_with(RejectingPublisher);

        let book = service
            .add_book(NewBook::new(author, "X", 2001, "poetry"))
            .unwrap();
        assert!(store.book(book.id).unwrap().is_some());
    }

    #[test]
    fn views_feed_the_popular_list() {
        let (service, _, author) = service_with(InMemoryLog::new());
        let a = service.add_book(NewBook::new(author, "A", 2001, "poetry")).unwrap();
        let b = service.add_book(NewBook::new(author, "B", 2002, "poetry")).unwrap();

        service.view_book(a.id, 1).unwrap();
        service.view_book(b.id, 1).unwrap();
        service.view_book(b.id, 2).unwrap();
        service.view_book(b.id, 2).unwrap();

        assert_eq!(service.book_views_count(a.id), 1);
        assert_eq!(service.book_views_count(b.id), 2);
        let popular: Vec<_> = service
            .popular_books()
            .unwrap()
            .into_iter()
            .map(|book| book.id)
            .collect();
        assert_eq!(popular, vec![b.id, a.id]);
    }

    #[test]
    fn unknown_book_view_is_not_counted() {
        let (service, _, _) = service_with(InMemoryLog::new());
        assert_eq!(service.view_book(42, 1).unwrap(), None);
        assert_eq!(service.book_views_count(42), 0);
        assert!(service.popular_books().unwrap().is_empty());
    }

    #[test]
    fn collections_come_from_the_store_on_a_cold_cache() {
        let (service, _, author) = service_with(InMemoryLog::new());
        service.add_book(NewBook::new(author, "A", 2001, "Poetry")).unwrap();
        service.add_book(NewBook::new(author, "B", 2002, "Drama")).unwrap();

        assert_eq!(service.categories().unwrap(), vec!["drama", "poetry"]);
        let titles: Vec<_> = service
            .new_books()
            .unwrap()
            .into_iter()
            .map(|book| book.title)
            .collect();
        assert_eq!(titles, vec!["B", "A"]);
    }
}
