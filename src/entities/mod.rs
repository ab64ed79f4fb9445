pub mod prelude;

pub mod book_reviews;
pub mod books_read;
pub mod books_reading;
pub mod books_to_read;
pub mod movie_reviews;
pub mod movies_to_watch;
pub mod movies_watched;
pub mod users;
