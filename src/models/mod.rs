pub mod book;
pub mod catalog;
pub mod movie;
pub mod shelf;

pub use book::{BookCategory, BookQuery, VolumeDetails};
pub use catalog::{CatalogItem, CatalogPage};
pub use movie::{ImageSize, MovieCategory, MovieDetails, MovieQuery};
pub use shelf::{
    BookEntry, BookReview, MovieEntry, MovieReview, NewBookEntry, NewMovieEntry, ProgressPatch,
    ReadingEntry, ReviewDraft, ReviewInput, ReviewPatch,
};
