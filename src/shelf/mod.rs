//! Per-user shelves with a local cache synchronized against the database.
//!
//! A [`ShelfStore`] mirrors one table for the identity held by its
//! [`Session`](crate::session::Session). Reads go to the backend only through
//! `load`/`refresh`; `contains`/`get` are local lookups. Mutations update the
//! cache only after the backend confirmed them.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{TmdbId, UserId, VolumeId};
use crate::models::{
    BookEntry, BookReview, MovieEntry, MovieReview, NewBookEntry, NewMovieEntry, ProgressPatch,
    ReadingEntry, ReviewDraft, ReviewPatch,
};

pub mod backend;
pub mod reading;
pub mod registry;
pub mod reviews;
mod store;

pub use backend::{
    BookReviewBackend, BookShelfBackend, MovieReviewBackend, MovieShelfBackend, ReadingBackend,
};
pub use registry::{ShelfRegistry, Shelves};
pub use reviews::ReviewRecord;
pub use store::{LoadState, ShelfStore};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShelfError {
    #[error("Debes iniciar sesión")]
    AuthRequired,

    /// Backend rejection, message kept verbatim.
    #[error("{0}")]
    Remote(String),

    #[error("{0}")]
    Validation(String),
}

/// A row that lives on a shelf, identified per user by its catalog id.
pub trait ShelfRecord: Clone + Send + Sync + 'static {
    type Key: PartialEq + Clone + Send + Sync + fmt::Display + 'static;
    type Draft: Send + 'static;
    type Patch: Send + 'static;

    fn key(&self) -> &Self::Key;
}

/// Remote side of a shelf. Every call is scoped to one user.
#[async_trait]
pub trait ShelfBackend<R: ShelfRecord>: Send + Sync {
    /// Rows ordered by status date, newest first.
    async fn list(&self, user: UserId) -> anyhow::Result<Vec<R>>;

    async fn insert(&self, user: UserId, draft: R::Draft) -> anyhow::Result<R>;

    async fn delete(&self, user: UserId, key: &R::Key) -> anyhow::Result<()>;

    async fn update(&self, user: UserId, key: &R::Key, patch: R::Patch) -> anyhow::Result<R> {
        let _ = (user, patch);
        anyhow::bail!("Rows on this shelf are immutable ({key})")
    }
}

impl ShelfRecord for MovieEntry {
    type Key = TmdbId;
    type Draft = NewMovieEntry;
    type Patch = ();

    fn key(&self) -> &TmdbId {
        &self.tmdb_id
    }
}

impl ShelfRecord for BookEntry {
    type Key = VolumeId;
    type Draft = NewBookEntry;
    type Patch = ();

    fn key(&self) -> &VolumeId {
        &self.google_books_id
    }
}

impl ShelfRecord for ReadingEntry {
    type Key = VolumeId;
    type Draft = NewBookEntry;
    type Patch = ProgressPatch;

    fn key(&self) -> &VolumeId {
        &self.google_books_id
    }
}

impl ShelfRecord for MovieReview {
    type Key = TmdbId;
    type Draft = ReviewDraft<NewMovieEntry>;
    type Patch = ReviewPatch;

    fn key(&self) -> &TmdbId {
        &self.tmdb_id
    }
}

impl ShelfRecord for BookReview {
    type Key = VolumeId;
    type Draft = ReviewDraft<NewBookEntry>;
    type Patch = ReviewPatch;

    fn key(&self) -> &VolumeId {
        &self.google_books_id
    }
}
