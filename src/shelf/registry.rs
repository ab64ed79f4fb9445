use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::task::JoinHandle;
use tracing::debug;

use super::backend::{
    BookReviewBackend, BookShelfBackend, MovieReviewBackend, MovieShelfBackend, ReadingBackend,
};
use super::{ShelfError, ShelfStore};
use crate::db::{BookShelf, MovieShelf, Store};
use crate::domain::UserId;
use crate::models::{BookEntry, BookReview, MovieEntry, MovieReview, ReadingEntry};
use crate::session::{Identity, Session};

/// The seven shelves of one session.
pub struct Shelves {
    session: Session,
    pub movies_to_watch: Arc<ShelfStore<MovieEntry>>,
    pub movies_watched: Arc<ShelfStore<MovieEntry>>,
    pub movie_reviews: Arc<ShelfStore<MovieReview>>,
    pub books_to_read: Arc<ShelfStore<BookEntry>>,
    pub books_reading: Arc<ShelfStore<ReadingEntry>>,
    pub books_read: Arc<ShelfStore<BookEntry>>,
    pub book_reviews: Arc<ShelfStore<BookReview>>,
    watchers: Mutex<Vec<JoinHandle<()>>>,
}

impl Shelves {
    #[must_use]
    pub fn new(session: Session, store: &Store) -> Self {
        Self {
            movies_to_watch: Arc::new(ShelfStore::new(
                "movies_to_watch",
                session.clone(),
                Arc::new(MovieShelfBackend::new(store.clone(), MovieShelf::ToWatch)),
            )),
            movies_watched: Arc::new(ShelfStore::new(
                "movies_watched",
                session.clone(),
                Arc::new(MovieShelfBackend::new(store.clone(), MovieShelf::Watched)),
            )),
            movie_reviews: Arc::new(ShelfStore::new(
                "movie_reviews",
                session.clone(),
                Arc::new(MovieReviewBackend::new(store.clone())),
            )),
            books_to_read: Arc::new(ShelfStore::new(
                "books_to_read",
                session.clone(),
                Arc::new(BookShelfBackend::new(store.clone(), BookShelf::ToRead)),
            )),
            books_reading: Arc::new(ShelfStore::new(
                "books_reading",
                session.clone(),
                Arc::new(ReadingBackend::new(store.clone())),
            )),
            books_read: Arc::new(ShelfStore::new(
                "books_read",
                session.clone(),
                Arc::new(BookShelfBackend::new(store.clone(), BookShelf::Read)),
            )),
            book_reviews: Arc::new(ShelfStore::new(
                "book_reviews",
                session.clone(),
                Arc::new(BookReviewBackend::new(store.clone())),
            )),
            session,
            watchers: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Loads every shelf concurrently.
    pub async fn load_all(&self) -> Result<(), ShelfError> {
        tokio::try_join!(
            self.movies_to_watch.load(),
            self.movies_watched.load(),
            self.movie_reviews.load(),
            self.books_to_read.load(),
            self.books_reading.load(),
            self.books_read.load(),
            self.book_reviews.load(),
        )?;
        Ok(())
    }

    /// Keeps every shelf in step with sign-in and sign-out until dropped.
    pub fn follow_session(&self) {
        let handles = [
            self.movies_to_watch.watch_session(),
            self.movies_watched.watch_session(),
            self.movie_reviews.watch_session(),
            self.books_to_read.watch_session(),
            self.books_reading.watch_session(),
            self.books_read.watch_session(),
            self.book_reviews.watch_session(),
        ];
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(handles);
    }
}

impl Drop for Shelves {
    fn drop(&mut self) {
        for handle in self
            .watchers
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
        {
            handle.abort();
        }
    }
}

/// Hands out one shared [`Shelves`] per user while anyone holds it.
pub struct ShelfRegistry {
    store: Store,
    entries: Mutex<HashMap<UserId, Weak<Shelves>>>,
}

impl ShelfRegistry {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            store,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn acquire(&self, identity: &Identity) -> Arc<Shelves> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, shelves| shelves.strong_count() > 0);

        if let Some(shelves) = entries.get(&identity.user_id).and_then(Weak::upgrade) {
            return shelves;
        }

        debug!(user = %identity.username, "Creating shelves");
        let shelves = Arc::new(Shelves::new(
            Session::signed_in(identity.clone()),
            &self.store,
        ));
        entries.insert(identity.user_id, Arc::downgrade(&shelves));
        shelves
    }

    /// Users with live shelves.
    #[must_use]
    pub fn active_users(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|shelves| shelves.strong_count() > 0)
            .count()
    }
}
