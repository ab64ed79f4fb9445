use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "book_reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    pub google_books_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub authors: String,

    pub thumbnail: Option<String>,

    pub rating: Option<i16>,

    #[sea_orm(column_type = "Text", nullable)]
    pub comment: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
