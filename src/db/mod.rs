use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{TmdbId, UserId, VolumeId};
use crate::models::{
    BookEntry, BookReview, MovieEntry, MovieReview, NewBookEntry, NewMovieEntry, ReadingEntry,
    ReviewDraft, ReviewPatch,
};

pub mod migrator;
pub mod repositories;

pub use migrator::m20261001_add_users::DEFAULT_API_KEY;
pub use repositories::shelf::{BookShelf, MovieShelf};
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");
        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to `sqlite::memory:` would see its own empty database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn shelf_repo(&self) -> repositories::shelf::ShelfRepository {
        repositories::shelf::ShelfRepository::new(self.conn.clone())
    }

    // Users

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo().create(username, password, security).await
    }

    /// The user when the password matches.
    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_user_password(
        &self,
        username: &str,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(username, new_password, security)
            .await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn regenerate_user_api_key(&self, username: &str) -> Result<String> {
        self.user_repo().regenerate_api_key(username).await
    }

    // Movie shelves

    pub async fn list_movies(&self, shelf: MovieShelf, user: UserId) -> Result<Vec<MovieEntry>> {
        self.shelf_repo().list_movies(shelf, user).await
    }

    pub async fn add_movie(
        &self,
        shelf: MovieShelf,
        user: UserId,
        draft: NewMovieEntry,
    ) -> Result<MovieEntry> {
        self.shelf_repo().add_movie(shelf, user, draft).await
    }

    pub async fn remove_movie(&self, shelf: MovieShelf, user: UserId, id: TmdbId) -> Result<u64> {
        self.shelf_repo().remove_movie(shelf, user, id).await
    }

    // Book shelves

    pub async fn list_books(&self, shelf: BookShelf, user: UserId) -> Result<Vec<BookEntry>> {
        self.shelf_repo().list_books(shelf, user).await
    }

    pub async fn add_book(
        &self,
        shelf: BookShelf,
        user: UserId,
        draft: NewBookEntry,
    ) -> Result<BookEntry> {
        self.shelf_repo().add_book(shelf, user, draft).await
    }

    pub async fn remove_book(&self, shelf: BookShelf, user: UserId, id: &VolumeId) -> Result<u64> {
        self.shelf_repo().remove_book(shelf, user, id).await
    }

    pub async fn list_reading(&self, user: UserId) -> Result<Vec<ReadingEntry>> {
        self.shelf_repo().list_reading(user).await
    }

    pub async fn add_reading(&self, user: UserId, draft: NewBookEntry) -> Result<ReadingEntry> {
        self.shelf_repo().add_reading(user, draft).await
    }

    pub async fn update_reading_progress(
        &self,
        user: UserId,
        id: &VolumeId,
        current_page: i32,
    ) -> Result<ReadingEntry> {
        self.shelf_repo()
            .update_reading_progress(user, id, current_page)
            .await
    }

    pub async fn remove_reading(&self, user: UserId, id: &VolumeId) -> Result<u64> {
        self.shelf_repo().remove_reading(user, id).await
    }

    // Reviews

    pub async fn list_movie_reviews(&self, user: UserId) -> Result<Vec<MovieReview>> {
        self.shelf_repo().list_movie_reviews(user).await
    }

    pub async fn add_movie_review(
        &self,
        user: UserId,
        draft: ReviewDraft<NewMovieEntry>,
    ) -> Result<MovieReview> {
        self.shelf_repo().add_movie_review(user, draft).await
    }

    pub async fn update_movie_review(
        &self,
        user: UserId,
        id: TmdbId,
        review: ReviewPatch,
    ) -> Result<MovieReview> {
        self.shelf_repo().update_movie_review(user, id, review).await
    }

    pub async fn remove_movie_review(&self, user: UserId, id: TmdbId) -> Result<u64> {
        self.shelf_repo().remove_movie_review(user, id).await
    }

    pub async fn list_book_reviews(&self, user: UserId) -> Result<Vec<BookReview>> {
        self.shelf_repo().list_book_reviews(user).await
    }

    pub async fn add_book_review(
        &self,
        user: UserId,
        draft: ReviewDraft<NewBookEntry>,
    ) -> Result<BookReview> {
        self.shelf_repo().add_book_review(user, draft).await
    }

    pub async fn update_book_review(
        &self,
        user: UserId,
        id: &VolumeId,
        review: ReviewPatch,
    ) -> Result<BookReview> {
        self.shelf_repo().update_book_review(user, id, review).await
    }

    pub async fn remove_book_review(&self, user: UserId, id: &VolumeId) -> Result<u64> {
        self.shelf_repo().remove_book_review(user, id).await
    }
}
