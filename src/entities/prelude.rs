pub use super::book_reviews::Entity as BookReviews;
pub use super::books_read::Entity as BooksRead;
pub use super::books_reading::Entity as BooksReading;
pub use super::books_to_read::Entity as BooksToRead;
pub use super::movie_reviews::Entity as MovieReviews;
pub use super::movies_to_watch::Entity as MoviesToWatch;
pub use super::movies_watched::Entity as MoviesWatched;
pub use super::users::Entity as Users;
