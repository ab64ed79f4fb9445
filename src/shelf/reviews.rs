use super::{ShelfError, ShelfRecord, ShelfStore};
use crate::models::{
    BookReview, MovieReview, NewBookEntry, NewMovieEntry, ReviewDraft, ReviewInput, ReviewPatch,
};

/// A review row, created from the reviewed item plus validated values.
pub trait ReviewRecord: ShelfRecord<Patch = ReviewPatch> {
    type Subject: Send + 'static;

    fn subject_key(subject: &Self::Subject) -> Self::Key;

    fn draft(subject: Self::Subject, review: ReviewPatch) -> Self::Draft;

    fn rating(&self) -> Option<u8>;

    fn comment(&self) -> Option<&str>;

    fn updated_at(&self) -> &str;
}

impl ReviewRecord for MovieReview {
    type Subject = NewMovieEntry;

    fn subject_key(subject: &NewMovieEntry) -> Self::Key {
        subject.tmdb_id
    }

    fn draft(subject: NewMovieEntry, review: ReviewPatch) -> Self::Draft {
        ReviewDraft { subject, review }
    }

    fn rating(&self) -> Option<u8> {
        self.rating
    }

    fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }
}

impl ReviewRecord for BookReview {
    type Subject = NewBookEntry;

    fn subject_key(subject: &NewBookEntry) -> Self::Key {
        subject.google_books_id.clone()
    }

    fn draft(subject: NewBookEntry, review: ReviewPatch) -> Self::Draft {
        ReviewDraft { subject, review }
    }

    fn rating(&self) -> Option<u8> {
        self.rating
    }

    fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }
}

impl<R: ReviewRecord> ShelfStore<R> {
    #[must_use]
    pub fn review(&self, key: &R::Key) -> Option<R> {
        self.get(key)
    }

    #[must_use]
    pub fn has_review(&self, key: &R::Key) -> bool {
        self.contains(key)
    }

    /// Validates the input before touching the backend.
    fn validate(&self, input: &ReviewInput) -> Result<ReviewPatch, ShelfError> {
        self.current_user()?;
        input.normalize().map_err(ShelfError::Validation)
    }

    pub async fn create(&self, subject: R::Subject, input: &ReviewInput) -> Result<R, ShelfError> {
        let review = self.validate(input)?;
        self.add(R::draft(subject, review)).await
    }

    /// Overwrites rating and comment of an existing review.
    pub async fn update(&self, key: &R::Key, input: &ReviewInput) -> Result<R, ShelfError> {
        let review = self.validate(input)?;
        self.apply_update(key, review).await
    }

    /// Updates the cached review of `subject`, or creates one.
    pub async fn save(&self, subject: R::Subject, input: &ReviewInput) -> Result<R, ShelfError> {
        self.validate(input)?;
        self.writable_user().await?;

        let key = R::subject_key(&subject);
        if self.has_review(&key) {
            self.update(&key, input).await
        } else {
            self.create(subject, input).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::domain::{TmdbId, UserId};
    use crate::session::{Identity, Session};
    use crate::shelf::{LoadState, MovieReviewBackend};
    use std::sync::Arc;

    async fn reviews(session: Session) -> ShelfStore<MovieReview> {
        let db = Store::new("sqlite::memory:").await.unwrap();
        let store = ShelfStore::new("movie_reviews", session, Arc::new(MovieReviewBackend::new(db)));
        store.load().await.unwrap();
        store
    }

    fn signed_in() -> Session {
        Session::signed_in(Identity::new(UserId::new(1), "admin"))
    }

    fn arrival() -> NewMovieEntry {
        NewMovieEntry::new(TmdbId::new(329_865), "La llegada")
    }

    #[tokio::test]
    async fn test_empty_review_is_rejected_before_backend() {
        let store = reviews(signed_in()).await;

        let result = store.create(arrival(), &ReviewInput::new(0, "  ")).await;

        assert!(matches!(result, Err(ShelfError::Validation(_))));
        assert_eq!(store.state(), LoadState::Ready);
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_rating_without_comment_is_accepted() {
        let store = reviews(signed_in()).await;

        let review = store.create(arrival(), &ReviewInput::new(7, "")).await.unwrap();

        assert_eq!(review.rating, Some(7));
        assert_eq!(review.comment, None);
        assert!(store.has_review(&TmdbId::new(329_865)));
    }

    #[tokio::test]
    async fn test_save_updates_existing_review() {
        let store = reviews(signed_in()).await;
        let created = store.save(arrival(), &ReviewInput::new(6, "")).await.unwrap();

        let updated = store
            .save(arrival(), &ReviewInput::new(0, "Mejor la segunda vez"))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.rating, None);
        assert_eq!(updated.comment.as_deref(), Some("Mejor la segunda vez"));
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(store.records().len(), 1);
        assert_eq!(
            store.review(&TmdbId::new(329_865)).unwrap().comment(),
            Some("Mejor la segunda vez")
        );
    }

    #[tokio::test]
    async fn test_save_twice_on_unloaded_store_updates() {
        let db = Store::new("sqlite::memory:").await.unwrap();
        let store: ShelfStore<MovieReview> =
            ShelfStore::new("movie_reviews", signed_in(), Arc::new(MovieReviewBackend::new(db)));

        let created = store.save(arrival(), &ReviewInput::new(6, "")).await.unwrap();
        let updated = store
            .save(arrival(), &ReviewInput::new(9, "Otra vez"))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.rating, Some(9));
        assert_eq!(store.state(), LoadState::Ready);
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_signed_out_review_requires_auth_first() {
        let store = reviews(Session::new()).await;

        assert_eq!(
            store.create(arrival(), &ReviewInput::new(0, "")).await,
            Err(ShelfError::AuthRequired)
        );
    }
}
