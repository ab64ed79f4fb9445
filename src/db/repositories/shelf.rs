use anyhow::{Context, Result};
use chrono::SecondsFormat;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    Value,
};

use crate::domain::{TmdbId, UserId, VolumeId};
use crate::entities::{
    book_reviews, books_read, books_reading, books_to_read, movie_reviews, movies_to_watch,
    movies_watched,
};
use crate::models::{
    BookEntry, BookReview, MovieEntry, MovieReview, NewBookEntry, NewMovieEntry, ReadingEntry,
    ReviewDraft, ReviewPatch,
};

/// Which of the two plain movie tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieShelf {
    ToWatch,
    Watched,
}

/// Which of the two plain book tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookShelf {
    ToRead,
    Read,
}

/// RFC 3339 UTC with microseconds, so lexical order is chronological.
#[must_use]
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn encode_authors(authors: &[String]) -> String {
    serde_json::to_string(authors).unwrap_or_else(|_| "[]".to_string())
}

fn decode_authors(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn decode_rating(rating: Option<i16>) -> Option<u8> {
    rating.and_then(|r| u8::try_from(r).ok()).filter(|r| *r > 0)
}

async fn list_for_user<E>(
    conn: &DatabaseConnection,
    user_column: E::Column,
    order_column: E::Column,
    id_column: E::Column,
    user: UserId,
) -> Result<Vec<E::Model>>
where
    E: EntityTrait,
{
    let rows = E::find()
        .filter(user_column.eq(user.value()))
        .order_by_desc(order_column)
        .order_by_desc(id_column)
        .all(conn)
        .await?;

    Ok(rows)
}

async fn find_for_user<E>(
    conn: &DatabaseConnection,
    user_column: E::Column,
    item_column: E::Column,
    user: UserId,
    item: impl Into<Value>,
) -> Result<Option<E::Model>>
where
    E: EntityTrait,
{
    let row = E::find()
        .filter(user_column.eq(user.value()))
        .filter(item_column.eq(item))
        .one(conn)
        .await?;

    Ok(row)
}

async fn delete_for_user<E>(
    conn: &DatabaseConnection,
    user_column: E::Column,
    item_column: E::Column,
    user: UserId,
    item: impl Into<Value>,
) -> Result<u64>
where
    E: EntityTrait,
{
    let result = E::delete_many()
        .filter(user_column.eq(user.value()))
        .filter(item_column.eq(item))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

impl From<movies_to_watch::Model> for MovieEntry {
    fn from(m: movies_to_watch::Model) -> Self {
        Self {
            id: m.id,
            user_id: UserId::new(m.user_id),
            tmdb_id: TmdbId::new(m.tmdb_id),
            title: m.title,
            poster_path: m.poster_path,
            description: m.description,
            listed_at: m.added_date,
            created_at: m.created_at,
        }
    }
}

impl From<movies_watched::Model> for MovieEntry {
    fn from(m: movies_watched::Model) -> Self {
        Self {
            id: m.id,
            user_id: UserId::new(m.user_id),
            tmdb_id: TmdbId::new(m.tmdb_id),
            title: m.title,
            poster_path: m.poster_path,
            description: m.description,
            listed_at: m.watched_date,
            created_at: m.created_at,
        }
    }
}

impl From<books_to_read::Model> for BookEntry {
    fn from(m: books_to_read::Model) -> Self {
        Self {
            id: m.id,
            user_id: UserId::new(m.user_id),
            google_books_id: VolumeId::new(m.google_books_id),
            title: m.title,
            authors: decode_authors(&m.authors),
            thumbnail: m.thumbnail,
            description: m.description,
            listed_at: m.added_date,
            created_at: m.created_at,
        }
    }
}

impl From<books_read::Model> for BookEntry {
    fn from(m: books_read::Model) -> Self {
        Self {
            id: m.id,
            user_id: UserId::new(m.user_id),
            google_books_id: VolumeId::new(m.google_books_id),
            title: m.title,
            authors: decode_authors(&m.authors),
            thumbnail: m.thumbnail,
            description: m.description,
            listed_at: m.finished_date,
            created_at: m.created_at,
        }
    }
}

impl From<books_reading::Model> for ReadingEntry {
    fn from(m: books_reading::Model) -> Self {
        Self {
            id: m.id,
            user_id: UserId::new(m.user_id),
            google_books_id: VolumeId::new(m.google_books_id),
            title: m.title,
            authors: decode_authors(&m.authors),
            thumbnail: m.thumbnail,
            description: m.description,
            current_page: m.current_page,
            total_pages: m.total_pages,
            listed_at: m.started_date,
            created_at: m.created_at,
        }
    }
}

impl From<movie_reviews::Model> for MovieReview {
    fn from(m: movie_reviews::Model) -> Self {
        Self {
            id: m.id,
            user_id: UserId::new(m.user_id),
            tmdb_id: TmdbId::new(m.tmdb_id),
            title: m.title,
            poster_path: m.poster_path,
            rating: decode_rating(m.rating),
            comment: m.comment,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<book_reviews::Model> for BookReview {
    fn from(m: book_reviews::Model) -> Self {
        Self {
            id: m.id,
            user_id: UserId::new(m.user_id),
            google_books_id: VolumeId::new(m.google_books_id),
            title: m.title,
            authors: decode_authors(&m.authors),
            thumbnail: m.thumbnail,
            rating: decode_rating(m.rating),
            comment: m.comment,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Reads and writes for the seven per-user shelves.
///
/// Every query is scoped by `user_id`. Inserts never check for an existing
/// row first; the unique `(user_id, external id)` index rejects duplicates.
pub struct ShelfRepository {
    conn: DatabaseConnection,
}

impl ShelfRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_movies(&self, shelf: MovieShelf, user: UserId) -> Result<Vec<MovieEntry>> {
        let rows: Vec<MovieEntry> = match shelf {
            MovieShelf::ToWatch => list_for_user::<movies_to_watch::Entity>(
                &self.conn,
                movies_to_watch::Column::UserId,
                movies_to_watch::Column::AddedDate,
                movies_to_watch::Column::Id,
                user,
            )
            .await?
            .into_iter()
            .map(MovieEntry::from)
            .collect(),
            MovieShelf::Watched => list_for_user::<movies_watched::Entity>(
                &self.conn,
                movies_watched::Column::UserId,
                movies_watched::Column::WatchedDate,
                movies_watched::Column::Id,
                user,
            )
            .await?
            .into_iter()
            .map(MovieEntry::from)
            .collect(),
        };

        Ok(rows)
    }

    pub async fn add_movie(
        &self,
        shelf: MovieShelf,
        user: UserId,
        draft: NewMovieEntry,
    ) -> Result<MovieEntry> {
        let now = timestamp();

        let entry: MovieEntry = match shelf {
            MovieShelf::ToWatch => movies_to_watch::ActiveModel {
                user_id: Set(user.value()),
                tmdb_id: Set(draft.tmdb_id.value()),
                title: Set(draft.title),
                poster_path: Set(draft.poster_path),
                description: Set(draft.description),
                added_date: Set(now.clone()),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&self.conn)
            .await?
            .into(),
            MovieShelf::Watched => movies_watched::ActiveModel {
                user_id: Set(user.value()),
                tmdb_id: Set(draft.tmdb_id.value()),
                title: Set(draft.title),
                poster_path: Set(draft.poster_path),
                description: Set(draft.description),
                watched_date: Set(now.clone()),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&self.conn)
            .await?
            .into(),
        };

        Ok(entry)
    }

    pub async fn remove_movie(&self, shelf: MovieShelf, user: UserId, id: TmdbId) -> Result<u64> {
        match shelf {
            MovieShelf::ToWatch => {
                delete_for_user::<movies_to_watch::Entity>(
                    &self.conn,
                    movies_to_watch::Column::UserId,
                    movies_to_watch::Column::TmdbId,
                    user,
                    id.value(),
                )
                .await
            }
            MovieShelf::Watched => {
                delete_for_user::<movies_watched::Entity>(
                    &self.conn,
                    movies_watched::Column::UserId,
                    movies_watched::Column::TmdbId,
                    user,
                    id.value(),
                )
                .await
            }
        }
    }

    pub async fn list_books(&self, shelf: BookShelf, user: UserId) -> Result<Vec<BookEntry>> {
        let rows: Vec<BookEntry> = match shelf {
            BookShelf::ToRead => list_for_user::<books_to_read::Entity>(
                &self.conn,
                books_to_read::Column::UserId,
                books_to_read::Column::AddedDate,
                books_to_read::Column::Id,
                user,
            )
            .await?
            .into_iter()
            .map(BookEntry::from)
            .collect(),
            BookShelf::Read => list_for_user::<books_read::Entity>(
                &self.conn,
                books_read::Column::UserId,
                books_read::Column::FinishedDate,
                books_read::Column::Id,
                user,
            )
            .await?
            .into_iter()
            .map(BookEntry::from)
            .collect(),
        };

        Ok(rows)
    }

    pub async fn add_book(
        &self,
        shelf: BookShelf,
        user: UserId,
        draft: NewBookEntry,
    ) -> Result<BookEntry> {
        let now = timestamp();
        let authors = encode_authors(&draft.authors);

        let entry: BookEntry = match shelf {
            BookShelf::ToRead => books_to_read::ActiveModel {
                user_id: Set(user.value()),
                google_books_id: Set(draft.google_books_id.to_string()),
                title: Set(draft.title),
                authors: Set(authors),
                thumbnail: Set(draft.thumbnail),
                description: Set(draft.description),
                added_date: Set(now.clone()),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&self.conn)
            .await?
            .into(),
            BookShelf::Read => books_read::ActiveModel {
                user_id: Set(user.value()),
                google_books_id: Set(draft.google_books_id.to_string()),
                title: Set(draft.title),
                authors: Set(authors),
                thumbnail: Set(draft.thumbnail),
                description: Set(draft.description),
                finished_date: Set(now.clone()),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&self.conn)
            .await?
            .into(),
        };

        Ok(entry)
    }

    pub async fn remove_book(&self, shelf: BookShelf, user: UserId, id: &VolumeId) -> Result<u64> {
        match shelf {
            BookShelf::ToRead => {
                delete_for_user::<books_to_read::Entity>(
                    &self.conn,
                    books_to_read::Column::UserId,
                    books_to_read::Column::GoogleBooksId,
                    user,
                    id.as_str(),
                )
                .await
            }
            BookShelf::Read => {
                delete_for_user::<books_read::Entity>(
                    &self.conn,
                    books_read::Column::UserId,
                    books_read::Column::GoogleBooksId,
                    user,
                    id.as_str(),
                )
                .await
            }
        }
    }

    pub async fn list_reading(&self, user: UserId) -> Result<Vec<ReadingEntry>> {
        let rows = list_for_user::<books_reading::Entity>(
            &self.conn,
            books_reading::Column::UserId,
            books_reading::Column::StartedDate,
            books_reading::Column::Id,
            user,
        )
        .await?;

        Ok(rows.into_iter().map(ReadingEntry::from).collect())
    }

    /// Starts a book at page 0.
    pub async fn add_reading(&self, user: UserId, draft: NewBookEntry) -> Result<ReadingEntry> {
        let now = timestamp();

        let row = books_reading::ActiveModel {
            user_id: Set(user.value()),
            google_books_id: Set(draft.google_books_id.to_string()),
            title: Set(draft.title),
            authors: Set(encode_authors(&draft.authors)),
            thumbnail: Set(draft.thumbnail),
            description: Set(draft.description),
            current_page: Set(0),
            total_pages: Set(draft.total_pages.filter(|p| *p > 0)),
            started_date: Set(now.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(row.into())
    }

    pub async fn update_reading_progress(
        &self,
        user: UserId,
        id: &VolumeId,
        current_page: i32,
    ) -> Result<ReadingEntry> {
        let row = find_for_user::<books_reading::Entity>(
            &self.conn,
            books_reading::Column::UserId,
            books_reading::Column::GoogleBooksId,
            user,
            id.as_str(),
        )
        .await?
        .with_context(|| format!("Book {id} is not on the reading shelf"))?;

        let mut active: books_reading::ActiveModel = row.into();
        active.current_page = Set(current_page);
        let row = active.update(&self.conn).await?;

        Ok(row.into())
    }

    pub async fn remove_reading(&self, user: UserId, id: &VolumeId) -> Result<u64> {
        delete_for_user::<books_reading::Entity>(
            &self.conn,
            books_reading::Column::UserId,
            books_reading::Column::GoogleBooksId,
            user,
            id.as_str(),
        )
        .await
    }

    pub async fn list_movie_reviews(&self, user: UserId) -> Result<Vec<MovieReview>> {
        let rows = list_for_user::<movie_reviews::Entity>(
            &self.conn,
            movie_reviews::Column::UserId,
            movie_reviews::Column::CreatedAt,
            movie_reviews::Column::Id,
            user,
        )
        .await?;

        Ok(rows.into_iter().map(MovieReview::from).collect())
    }

    pub async fn add_movie_review(
        &self,
        user: UserId,
        draft: ReviewDraft<NewMovieEntry>,
    ) -> Result<MovieReview> {
        let now = timestamp();
        let ReviewDraft { subject, review } = draft;

        let row = movie_reviews::ActiveModel {
            user_id: Set(user.value()),
            tmdb_id: Set(subject.tmdb_id.value()),
            title: Set(subject.title),
            poster_path: Set(subject.poster_path),
            rating: Set(review.rating.map(i16::from)),
            comment: Set(review.comment),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(row.into())
    }

    /// Overwrites rating and comment and refreshes `updated_at`.
    pub async fn update_movie_review(
        &self,
        user: UserId,
        id: TmdbId,
        review: ReviewPatch,
    ) -> Result<MovieReview> {
        let row = find_for_user::<movie_reviews::Entity>(
            &self.conn,
            movie_reviews::Column::UserId,
            movie_reviews::Column::TmdbId,
            user,
            id.value(),
        )
        .await?
        .with_context(|| format!("No review for movie {id}"))?;

        let mut active: movie_reviews::ActiveModel = row.into();
        active.rating = Set(review.rating.map(i16::from));
        active.comment = Set(review.comment);
        active.updated_at = Set(timestamp());
        let row = active.update(&self.conn).await?;

        Ok(row.into())
    }

    pub async fn remove_movie_review(&self, user: UserId, id: TmdbId) -> Result<u64> {
        delete_for_user::<movie_reviews::Entity>(
            &self.conn,
            movie_reviews::Column::UserId,
            movie_reviews::Column::TmdbId,
            user,
            id.value(),
        )
        .await
    }

    pub async fn list_book_reviews(&self, user: UserId) -> Result<Vec<BookReview>> {
        let rows = list_for_user::<book_reviews::Entity>(
            &self.conn,
            book_reviews::Column::UserId,
            book_reviews::Column::CreatedAt,
            book_reviews::Column::Id,
            user,
        )
        .await?;

        Ok(rows.into_iter().map(BookReview::from).collect())
    }

    pub async fn add_book_review(
        &self,
        user: UserId,
        draft: ReviewDraft<NewBookEntry>,
    ) -> Result<BookReview> {
        let now = timestamp();
        let ReviewDraft { subject, review } = draft;

        let row = book_reviews::ActiveModel {
            user_id: Set(user.value()),
            google_books_id: Set(subject.google_books_id.to_string()),
            title: Set(subject.title),
            authors: Set(encode_authors(&subject.authors)),
            thumbnail: Set(subject.thumbnail),
            rating: Set(review.rating.map(i16::from)),
            comment: Set(review.comment),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(row.into())
    }

    pub async fn update_book_review(
        &self,
        user: UserId,
        id: &VolumeId,
        review: ReviewPatch,
    ) -> Result<BookReview> {
        let row = find_for_user::<book_reviews::Entity>(
            &self.conn,
            book_reviews::Column::UserId,
            book_reviews::Column::GoogleBooksId,
            user,
            id.as_str(),
        )
        .await?
        .with_context(|| format!("No review for book {id}"))?;

        let mut active: book_reviews::ActiveModel = row.into();
        active.rating = Set(review.rating.map(i16::from));
        active.comment = Set(review.comment);
        active.updated_at = Set(timestamp());
        let row = active.update(&self.conn).await?;

        Ok(row.into())
    }

    pub async fn remove_book_review(&self, user: UserId, id: &VolumeId) -> Result<u64> {
        delete_for_user::<book_reviews::Entity>(
            &self.conn,
            book_reviews::Column::UserId,
            book_reviews::Column::GoogleBooksId,
            user,
            id.as_str(),
        )
        .await
    }
}
