//! [`ShelfBackend`] implementations over the sea-orm [`Store`].

use async_trait::async_trait;

use super::ShelfBackend;
use crate::db::{BookShelf, MovieShelf, Store};
use crate::domain::{TmdbId, UserId, VolumeId};
use crate::models::{
    BookEntry, BookReview, MovieEntry, MovieReview, NewBookEntry, NewMovieEntry, ProgressPatch,
    ReadingEntry, ReviewDraft, ReviewPatch,
};

pub struct MovieShelfBackend {
    store: Store,
    shelf: MovieShelf,
}

impl MovieShelfBackend {
    #[must_use]
    pub const fn new(store: Store, shelf: MovieShelf) -> Self {
        Self { store, shelf }
    }
}

#[async_trait]
impl ShelfBackend<MovieEntry> for MovieShelfBackend {
    async fn list(&self, user: UserId) -> anyhow::Result<Vec<MovieEntry>> {
        self.store.list_movies(self.shelf, user).await
    }

    async fn insert(&self, user: UserId, draft: NewMovieEntry) -> anyhow::Result<MovieEntry> {
        self.store.add_movie(self.shelf, user, draft).await
    }

    async fn delete(&self, user: UserId, key: &TmdbId) -> anyhow::Result<()> {
        self.store.remove_movie(self.shelf, user, *key).await?;
        Ok(())
    }
}

pub struct BookShelfBackend {
    store: Store,
    shelf: BookShelf,
}

impl BookShelfBackend {
    #[must_use]
    pub const fn new(store: Store, shelf: BookShelf) -> Self {
        Self { store, shelf }
    }
}

#[async_trait]
impl ShelfBackend<BookEntry> for BookShelfBackend {
    async fn list(&self, user: UserId) -> anyhow::Result<Vec<BookEntry>> {
        self.store.list_books(self.shelf, user).await
    }

    async fn insert(&self, user: UserId, draft: NewBookEntry) -> anyhow::Result<BookEntry> {
        self.store.add_book(self.shelf, user, draft).await
    }

    async fn delete(&self, user: UserId, key: &VolumeId) -> anyhow::Result<()> {
        self.store.remove_book(self.shelf, user, key).await?;
        Ok(())
    }
}

pub struct ReadingBackend {
    store: Store,
}

impl ReadingBackend {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ShelfBackend<ReadingEntry> for ReadingBackend {
    async fn list(&self, user: UserId) -> anyhow::Result<Vec<ReadingEntry>> {
        self.store.list_reading(user).await
    }

    async fn insert(&self, user: UserId, draft: NewBookEntry) -> anyhow::Result<ReadingEntry> {
        self.store.add_reading(user, draft).await
    }

    async fn delete(&self, user: UserId, key: &VolumeId) -> anyhow::Result<()> {
        self.store.remove_reading(user, key).await?;
        Ok(())
    }

    async fn update(
        &self,
        user: UserId,
        key: &VolumeId,
        patch: ProgressPatch,
    ) -> anyhow::Result<ReadingEntry> {
        self.store
            .update_reading_progress(user, key, patch.current_page)
            .await
    }
}

pub struct MovieReviewBackend {
    store: Store,
}

impl MovieReviewBackend {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ShelfBackend<MovieReview> for MovieReviewBackend {
    async fn list(&self, user: UserId) -> anyhow::Result<Vec<MovieReview>> {
        self.store.list_movie_reviews(user).await
    }

    async fn insert(
        &self,
        user: UserId,
        draft: ReviewDraft<NewMovieEntry>,
    ) -> anyhow::Result<MovieReview> {
        self.store.add_movie_review(user, draft).await
    }

    async fn delete(&self, user: UserId, key: &TmdbId) -> anyhow::Result<()> {
        self.store.remove_movie_review(user, *key).await?;
        Ok(())
    }

    async fn update(
        &self,
        user: UserId,
        key: &TmdbId,
        patch: ReviewPatch,
    ) -> anyhow::Result<MovieReview> {
        self.store.update_movie_review(user, *key, patch).await
    }
}

pub struct BookReviewBackend {
    store: Store,
}

impl BookReviewBackend {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ShelfBackend<BookReview> for BookReviewBackend {
    async fn list(&self, user: UserId) -> anyhow::Result<Vec<BookReview>> {
        self.store.list_book_reviews(user).await
    }

    async fn insert(
        &self,
        user: UserId,
        draft: ReviewDraft<NewBookEntry>,
    ) -> anyhow::Result<BookReview> {
        self.store.add_book_review(user, draft).await
    }

    async fn delete(&self, user: UserId, key: &VolumeId) -> anyhow::Result<()> {
        self.store.remove_book_review(user, key).await?;
        Ok(())
    }

    async fn update(
        &self,
        user: UserId,
        key: &VolumeId,
        patch: ReviewPatch,
    ) -> anyhow::Result<BookReview> {
        self.store.update_book_review(user, key, patch).await
    }
}
