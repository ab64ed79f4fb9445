use sea_orm::entity::prelude::*;

/// Books in progress, with the page the user is on.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "books_reading")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    pub google_books_id: String,

    pub title: String,

    /// JSON array of author names
    #[sea_orm(column_type = "Text")]
    pub authors: String,

    pub thumbnail: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(default_value = 0)]
    pub current_page: i32,

    pub total_pages: Option<i32>,

    pub started_date: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
