use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{ShelfBackend, ShelfError, ShelfRecord};
use crate::domain::UserId;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum LoadState {
    /// No identity, nothing loaded.
    Idle,
    Loading,
    Ready,
    Error(String),
}

struct Inner<R> {
    state: LoadState,
    records: Vec<R>,
    loaded_for: Option<UserId>,
}

/// Cached view of one shelf for the identity of a [`Session`].
pub struct ShelfStore<R: ShelfRecord> {
    name: &'static str,
    session: Session,
    backend: Arc<dyn ShelfBackend<R>>,
    inner: RwLock<Inner<R>>,
}

impl<R: ShelfRecord> ShelfStore<R> {
    pub fn new(name: &'static str, session: Session, backend: Arc<dyn ShelfBackend<R>>) -> Self {
        Self {
            name,
            session,
            backend,
            inner: RwLock::new(Inner {
                state: LoadState::Idle,
                records: Vec::new(),
                loaded_for: None,
            }),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner<R>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner<R>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn current_user(&self) -> Result<UserId, ShelfError> {
        self.session.user_id().ok_or(ShelfError::AuthRequired)
    }

    /// Signed-in user, with the cache loaded for them so confirmed writes land in it.
    pub(super) async fn writable_user(&self) -> Result<UserId, ShelfError> {
        let user = self.current_user()?;
        if self.loaded_for() != Some(user) {
            self.load().await?;
        }
        Ok(user)
    }

    /// Records the failure in the load state and turns it into the caller's error.
    fn fail(&self, action: &str, err: &anyhow::Error) -> ShelfError {
        let message = err.root_cause().to_string();
        warn!(shelf = self.name, action, error = %message, "Shelf operation failed");
        self.write().state = LoadState::Error(message.clone());
        ShelfError::Remote(message)
    }

    /// Fetches every row of the signed-in user, replacing the cache.
    ///
    /// Without an identity the cache is cleared and no backend call is made.
    pub async fn load(&self) -> Result<(), ShelfError> {
        let Some(user) = self.session.user_id() else {
            let mut inner = self.write();
            inner.records.clear();
            inner.loaded_for = None;
            inner.state = LoadState::Idle;
            return Ok(());
        };

        self.write().state = LoadState::Loading;

        let result = self.backend.list(user).await;

        if self.session.user_id() != Some(user) {
            debug!(shelf = self.name, %user, "Identity changed during load, discarding rows");
            return Ok(());
        }

        match result {
            Ok(rows) => {
                let mut inner = self.write();
                inner.records = rows;
                inner.loaded_for = Some(user);
                inner.state = LoadState::Ready;
                Ok(())
            }
            Err(err) => Err(self.fail("list", &err)),
        }
    }

    pub async fn refresh(&self) -> Result<(), ShelfError> {
        self.load().await
    }

    /// Loads unless the cache already holds the current user's rows.
    pub async fn ensure_loaded(&self) -> Result<(), ShelfError> {
        let fresh = {
            let inner = self.read();
            inner.state == LoadState::Ready
                && inner.loaded_for.is_some()
                && inner.loaded_for == self.session.user_id()
        };
        if fresh { Ok(()) } else { self.load().await }
    }

    #[must_use]
    pub fn records(&self) -> Vec<R> {
        self.read().records.clone()
    }

    #[must_use]
    pub fn state(&self) -> LoadState {
        self.read().state.clone()
    }

    #[must_use]
    pub fn loaded_for(&self) -> Option<UserId> {
        self.read().loaded_for
    }

    #[must_use]
    pub fn contains(&self, key: &R::Key) -> bool {
        self.read().records.iter().any(|r| r.key() == key)
    }

    #[must_use]
    pub fn get(&self, key: &R::Key) -> Option<R> {
        self.read().records.iter().find(|r| r.key() == key).cloned()
    }

    /// Inserts a row for the signed-in user and prepends it to the cache.
    pub async fn add(&self, draft: R::Draft) -> Result<R, ShelfError> {
        let user = self.writable_user().await?;

        match self.backend.insert(user, draft).await {
            Ok(record) => {
                let mut inner = self.write();
                if inner.loaded_for == Some(user) {
                    inner.records.insert(0, record.clone());
                    inner.state = LoadState::Ready;
                }
                Ok(record)
            }
            Err(err) => Err(self.fail("insert", &err)),
        }
    }

    pub async fn remove(&self, key: &R::Key) -> Result<(), ShelfError> {
        let user = self.writable_user().await?;

        match self.backend.delete(user, key).await {
            Ok(()) => {
                let mut inner = self.write();
                if inner.loaded_for == Some(user) {
                    inner.records.retain(|r| r.key() != key);
                    inner.state = LoadState::Ready;
                }
                Ok(())
            }
            Err(err) => Err(self.fail("delete", &err)),
        }
    }

    /// Writes a patch for one row and swaps the returned row into the cache.
    pub(super) async fn apply_update(&self, key: &R::Key, patch: R::Patch) -> Result<R, ShelfError> {
        let user = self.writable_user().await?;

        match self.backend.update(user, key, patch).await {
            Ok(record) => {
                let mut inner = self.write();
                if inner.loaded_for == Some(user) {
                    if let Some(slot) = inner.records.iter_mut().find(|r| r.key() == key) {
                        *slot = record.clone();
                    }
                    inner.state = LoadState::Ready;
                }
                Ok(record)
            }
            Err(err) => Err(self.fail("update", &err)),
        }
    }

    /// Reloads wholesale when the session identity is not the one cached.
    pub async fn sync_identity(&self) -> Result<(), ShelfError> {
        if self.loaded_for() == self.session.user_id() {
            return Ok(());
        }

        {
            let mut inner = self.write();
            inner.records.clear();
            inner.loaded_for = None;
            inner.state = LoadState::Idle;
        }
        self.load().await
    }

    /// Follows identity changes until the store is dropped.
    pub fn watch_session(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.session.subscribe();
        let store = Arc::downgrade(self);

        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let Some(store) = store.upgrade() else {
                    break;
                };
                // Failures are already recorded in the load state.
                let _ = store.sync_identity().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VolumeId;
    use crate::models::{BookEntry, NewBookEntry};
    use crate::session::Identity;
    use crate::shelf::testing::FakeBooks;

    fn store(session: &Session) -> (Arc<FakeBooks>, ShelfStore<BookEntry>) {
        let backend = Arc::new(FakeBooks::default());
        let store = ShelfStore::new("books_to_read", session.clone(), backend.clone());
        (backend, store)
    }

    fn dune() -> NewBookEntry {
        NewBookEntry::new(VolumeId::new("abc"), "Dune")
    }

    fn existing_row() -> BookEntry {
        BookEntry {
            id: 1,
            user_id: UserId::new(1),
            google_books_id: VolumeId::new("xyz"),
            title: "Hyperion".into(),
            authors: Vec::new(),
            thumbnail: None,
            description: None,
            listed_at: String::new(),
            created_at: String::new(),
        }
    }

    fn ana() -> Identity {
        Identity::new(UserId::new(1), "ana")
    }

    #[tokio::test]
    async fn test_signed_out_load_is_empty_without_backend_call() {
        let session = Session::new();
        let (backend, store) = store(&session);

        store.load().await.unwrap();

        assert!(store.records().is_empty());
        assert_eq!(store.state(), LoadState::Idle);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_mutations_require_identity() {
        let session = Session::new();
        let (backend, store) = store(&session);

        assert_eq!(store.add(dune()).await, Err(ShelfError::AuthRequired));
        assert_eq!(
            store.remove(&VolumeId::new("abc")).await,
            Err(ShelfError::AuthRequired)
        );
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_add_then_remove() {
        let session = Session::signed_in(ana());
        let (_backend, store) = store(&session);
        store.load().await.unwrap();

        let row = store.add(dune()).await.unwrap();
        assert_eq!(row.title, "Dune");
        assert!(store.contains(&VolumeId::new("abc")));
        assert_eq!(store.records().len(), 1);

        store.remove(&VolumeId::new("abc")).await.unwrap();
        assert!(!store.contains(&VolumeId::new("abc")));
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_add_prepends() {
        let session = Session::signed_in(ana());
        let (_backend, store) = store(&session);
        store.load().await.unwrap();

        store.add(dune()).await.unwrap();
        store
            .add(NewBookEntry::new(VolumeId::new("xyz"), "Hyperion"))
            .await
            .unwrap();

        let titles: Vec<_> = store.records().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, ["Hyperion", "Dune"]);
    }

    #[tokio::test]
    async fn test_duplicate_add_is_remote_error_and_keeps_cache() {
        let session = Session::signed_in(ana());
        let (_backend, store) = store(&session);
        store.load().await.unwrap();
        store.add(dune()).await.unwrap();

        let err = store.add(dune()).await.unwrap_err();

        assert!(matches!(err, ShelfError::Remote(ref msg) if msg.contains("UNIQUE")));
        assert_eq!(store.records().len(), 1);
        assert!(matches!(store.state(), LoadState::Error(_)));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_cache_and_recovers() {
        let session = Session::signed_in(ana());
        let (backend, store) = store(&session);
        store.load().await.unwrap();
        store.add(dune()).await.unwrap();

        backend.fail("connection reset");
        assert_eq!(
            store.load().await,
            Err(ShelfError::Remote("connection reset".to_string()))
        );
        assert_eq!(store.state(), LoadState::Error("connection reset".to_string()));
        assert_eq!(store.records().len(), 1);

        *backend.fail_with.lock().unwrap() = None;
        store.load().await.unwrap();
        assert_eq!(store.state(), LoadState::Ready);
    }

    #[tokio::test]
    async fn test_write_on_unloaded_store_lands_in_cache() {
        let session = Session::signed_in(ana());
        let (backend, store) = store(&session);
        backend.rows.lock().unwrap().push(existing_row());

        store.add(dune()).await.unwrap();

        assert_eq!(store.state(), LoadState::Ready);
        assert_eq!(store.loaded_for(), Some(UserId::new(1)));
        let titles: Vec<_> = store.records().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, ["Dune", "Hyperion"]);

        store.remove(&VolumeId::new("xyz")).await.unwrap();
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_remote_error_message_appears_once() {
        let session = Session::signed_in(ana());
        let (backend, store) = store(&session);
        store.load().await.unwrap();
        backend.fail_with_context("UNIQUE constraint failed", "Failed to insert row");

        let err = store.add(dune()).await.unwrap_err();

        assert_eq!(err, ShelfError::Remote("UNIQUE constraint failed".to_string()));
    }

    #[tokio::test]
    async fn test_identity_change_resyncs_wholesale() {
        let session = Session::signed_in(ana());
        let (_backend, store) = store(&session);
        store.load().await.unwrap();
        store.add(dune()).await.unwrap();

        session.set(Some(Identity::new(UserId::new(2), "bruno")));
        store.sync_identity().await.unwrap();

        assert_eq!(store.loaded_for(), Some(UserId::new(2)));
        assert!(store.records().is_empty());

        session.sign_out();
        store.sync_identity().await.unwrap();
        assert_eq!(store.state(), LoadState::Idle);
        assert_eq!(store.loaded_for(), None);
    }

    #[tokio::test]
    async fn test_watch_session_follows_sign_out() {
        let session = Session::signed_in(ana());
        let (_backend, store) = store(&session);
        let store = Arc::new(store);
        store.load().await.unwrap();
        store.add(dune()).await.unwrap();

        let watcher = store.watch_session();
        session.sign_out();

        for _ in 0..50 {
            if store.loaded_for().is_none() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(store.records().is_empty());
        watcher.abort();
    }
}
