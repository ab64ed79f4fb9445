use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{EntityTrait, Schema};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// `(table, external id column, status-date column)` for every shelf.
const SHELVES: [(&str, &str, &str); 7] = [
    ("movies_to_watch", "tmdb_id", "added_date"),
    ("movies_watched", "tmdb_id", "watched_date"),
    ("movie_reviews", "tmdb_id", "created_at"),
    ("books_to_read", "google_books_id", "added_date"),
    ("books_reading", "google_books_id", "started_date"),
    ("books_read", "google_books_id", "finished_date"),
    ("book_reviews", "google_books_id", "created_at"),
];

async fn create<E: EntityTrait>(
    manager: &SchemaManager<'_>,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    manager
        .create_table(schema.create_table_from_entity(entity).if_not_exists().to_owned())
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        create(manager, &schema, MoviesToWatch).await?;
        create(manager, &schema, MoviesWatched).await?;
        create(manager, &schema, MovieReviews).await?;
        create(manager, &schema, BooksToRead).await?;
        create(manager, &schema, BooksReading).await?;
        create(manager, &schema, BooksRead).await?;
        create(manager, &schema, BookReviews).await?;

        let conn = manager.get_connection();

        // One row per (user, catalog item) per shelf; duplicates are rejected here.
        for (table, external_id, listed_at) in SHELVES {
            conn.execute_unprepared(&format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_user_item ON {table}(user_id, {external_id})"
            ))
            .await?;

            conn.execute_unprepared(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_user_listed ON {table}(user_id, {listed_at} DESC)"
            ))
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (table, _, _) in SHELVES {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).if_exists().to_owned())
                .await?;
        }

        Ok(())
    }
}
