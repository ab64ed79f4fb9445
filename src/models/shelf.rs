//! Rows of the seven per-user shelves and the drafts used to create them.

use serde::{Deserialize, Serialize};

use crate::domain::{TmdbId, UserId, VolumeId};

/// Highest star value a review can carry; 0 means "no rating".
pub const MAX_RATING: u8 = 10;

/// Row of `movies_to_watch` or `movies_watched`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieEntry {
    pub id: i32,
    pub user_id: UserId,
    pub tmdb_id: TmdbId,
    pub title: String,
    pub poster_path: Option<String>,
    pub description: Option<String>,
    /// `added_date` or `watched_date` depending on the shelf.
    pub listed_at: String,
    pub created_at: String,
}

/// Row of `books_to_read` or `books_read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookEntry {
    pub id: i32,
    pub user_id: UserId,
    pub google_books_id: VolumeId,
    pub title: String,
    pub authors: Vec<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    /// `added_date` or `finished_date` depending on the shelf.
    pub listed_at: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadingEntry {
    pub id: i32,
    pub user_id: UserId,
    pub google_books_id: VolumeId,
    pub title: String,
    pub authors: Vec<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub current_page: i32,
    pub total_pages: Option<i32>,
    /// `started_date`
    pub listed_at: String,
    pub created_at: String,
}

impl ReadingEntry {
    /// Rounded percentage read; 0 without a usable page count.
    #[must_use]
    pub fn progress(&self) -> u8 {
        progress_percent(self.current_page, self.total_pages)
    }
}

#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn progress_percent(current_page: i32, total_pages: Option<i32>) -> u8 {
    match total_pages {
        Some(total) if total > 0 => {
            let percent = (f64::from(current_page) / f64::from(total) * 100.0).round();
            percent.clamp(0.0, 100.0) as u8
        }
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieReview {
    pub id: i32,
    pub user_id: UserId,
    pub tmdb_id: TmdbId,
    pub title: String,
    pub poster_path: Option<String>,
    pub rating: Option<u8>,
    pub comment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookReview {
    pub id: i32,
    pub user_id: UserId,
    pub google_books_id: VolumeId,
    pub title: String,
    pub authors: Vec<String>,
    pub thumbnail: Option<String>,
    pub rating: Option<u8>,
    pub comment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Movie fields copied from the catalog when a row is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovieEntry {
    pub tmdb_id: TmdbId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewMovieEntry {
    #[must_use]
    pub fn new(tmdb_id: TmdbId, title: impl Into<String>) -> Self {
        Self {
            tmdb_id,
            title: title.into(),
            poster_path: None,
            description: None,
        }
    }
}

impl From<&MovieEntry> for NewMovieEntry {
    fn from(entry: &MovieEntry) -> Self {
        Self {
            tmdb_id: entry.tmdb_id,
            title: entry.title.clone(),
            poster_path: entry.poster_path.clone(),
            description: entry.description.clone(),
        }
    }
}

/// Book fields copied from the catalog when a row is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookEntry {
    pub google_books_id: VolumeId,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Only stored on the reading shelf.
    #[serde(default)]
    pub total_pages: Option<i32>,
}

impl NewBookEntry {
    #[must_use]
    pub fn new(google_books_id: VolumeId, title: impl Into<String>) -> Self {
        Self {
            google_books_id,
            title: title.into(),
            authors: Vec::new(),
            thumbnail: None,
            description: None,
            total_pages: None,
        }
    }
}

impl From<&BookEntry> for NewBookEntry {
    fn from(entry: &BookEntry) -> Self {
        Self {
            google_books_id: entry.google_books_id.clone(),
            title: entry.title.clone(),
            authors: entry.authors.clone(),
            thumbnail: entry.thumbnail.clone(),
            description: entry.description.clone(),
            total_pages: None,
        }
    }
}

impl From<&ReadingEntry> for NewBookEntry {
    fn from(entry: &ReadingEntry) -> Self {
        Self {
            google_books_id: entry.google_books_id.clone(),
            title: entry.title.clone(),
            authors: entry.authors.clone(),
            thumbnail: entry.thumbnail.clone(),
            description: entry.description.clone(),
            total_pages: entry.total_pages,
        }
    }
}

/// Raw review form input. A rating of 0 is the star widget's unset value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInput {
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

impl ReviewInput {
    #[must_use]
    pub fn new(rating: u8, comment: impl Into<String>) -> Self {
        Self {
            rating,
            comment: comment.into(),
        }
    }

    /// Normalized `(rating, comment)`: 0 and blank become `None`, at least one must remain.
    pub fn normalize(&self) -> Result<ReviewPatch, String> {
        if self.rating > MAX_RATING {
            return Err(format!(
                "La calificación debe estar entre 1 y {MAX_RATING}"
            ));
        }

        let rating = (self.rating > 0).then_some(self.rating);
        let comment = Some(self.comment.trim().to_string()).filter(|c| !c.is_empty());

        if rating.is_none() && comment.is_none() {
            return Err("Agrega una calificación o un comentario".to_string());
        }

        Ok(ReviewPatch { rating, comment })
    }
}

/// Validated review values written to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPatch {
    pub rating: Option<u8>,
    pub comment: Option<String>,
}

/// Subject of a review plus its validated values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft<S> {
    pub subject: S,
    pub review: ReviewPatch,
}

/// Page update for a reading row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressPatch {
    pub current_page: i32,
}
