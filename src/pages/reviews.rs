use serde::Serialize;

use crate::models::ReviewInput;
use crate::shelf::{ReviewRecord, ShelfError, ShelfStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    Editing,
    Viewing,
}

/// Star rating plus comment form shown on details pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewForm {
    pub mode: ReviewMode,
    pub rating: u8,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Default for ReviewForm {
    fn default() -> Self {
        Self {
            mode: ReviewMode::Editing,
            rating: 0,
            comment: String::new(),
            error: None,
            updated_at: None,
        }
    }
}

impl ReviewForm {
    /// Viewing an existing review, or an empty editor.
    #[must_use]
    pub fn for_record<R: ReviewRecord>(record: Option<&R>) -> Self {
        record.map_or_else(Self::default, |record| Self {
            mode: ReviewMode::Viewing,
            rating: record.rating().unwrap_or(0),
            comment: record.comment().unwrap_or_default().to_string(),
            error: None,
            updated_at: Some(record.updated_at().to_string()),
        })
    }

    pub fn edit(&mut self) {
        self.mode = ReviewMode::Editing;
    }

    pub fn set_rating(&mut self, rating: u8) {
        self.rating = rating;
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    #[must_use]
    pub fn input(&self) -> ReviewInput {
        ReviewInput::new(self.rating, self.comment.clone())
    }

    /// Creates or updates the review; invalid input never reaches the store.
    pub async fn submit<R: ReviewRecord>(
        &mut self,
        store: &ShelfStore<R>,
        subject: R::Subject,
    ) -> Result<R, ShelfError> {
        let input = self.input();
        if let Err(message) = input.normalize() {
            self.error = Some(message.clone());
            return Err(ShelfError::Validation(message));
        }

        match store.save(subject, &input).await {
            Ok(record) => {
                *self = Self::for_record(Some(&record));
                Ok(record)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Deletes the review and resets to an empty editor.
    pub async fn delete<R: ReviewRecord>(
        &mut self,
        store: &ShelfStore<R>,
        key: &R::Key,
    ) -> Result<(), ShelfError> {
        match store.remove(key).await {
            Ok(()) => {
                *self = Self::default();
                Ok(())
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::domain::{UserId, VolumeId};
    use crate::models::{BookReview, NewBookEntry};
    use crate::session::{Identity, Session};
    use crate::shelf::BookReviewBackend;
    use std::sync::Arc;

    async fn store() -> ShelfStore<BookReview> {
        let db = Store::new("sqlite::memory:").await.unwrap();
        let session = Session::signed_in(Identity::new(UserId::new(1), "admin"));
        let store = ShelfStore::new("book_reviews", session, Arc::new(BookReviewBackend::new(db)));
        store.load().await.unwrap();
        store
    }

    fn dune() -> NewBookEntry {
        let mut subject = NewBookEntry::new(VolumeId::new("abc"), "Dune");
        subject.authors = vec!["Frank Herbert".into()];
        subject
    }

    #[tokio::test]
    async fn test_blank_submit_sets_error_without_saving() {
        let store = store().await;
        let mut form = ReviewForm::default();

        let result = form.submit(&store, dune()).await;

        assert!(matches!(result, Err(ShelfError::Validation(_))));
        assert!(form.error.is_some());
        assert_eq!(form.mode, ReviewMode::Editing);
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_submit_switches_to_viewing_and_delete_resets() {
        let store = store().await;
        let mut form = ReviewForm::default();
        form.set_rating(9);
        form.set_comment("Especia");

        let saved = form.submit(&store, dune()).await.unwrap();
        assert_eq!(saved.authors, ["Frank Herbert"]);
        assert_eq!(form.mode, ReviewMode::Viewing);
        assert_eq!(form.rating, 9);

        form.edit();
        form.set_rating(10);
        form.submit(&store, dune()).await.unwrap();
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.records()[0].rating, Some(10));

        form.delete(&store, &VolumeId::new("abc")).await.unwrap();
        assert_eq!(form, ReviewForm::default());
        assert!(store.records().is_empty());
    }
}
