use sea_orm_migration::prelude::*;

pub mod m20261001_add_users;
mod m20261002_create_shelves;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_add_users::Migration),
            Box::new(m20261002_create_shelves::Migration),
        ]
    }
}
