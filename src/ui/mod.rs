//! View models for cards, menus, search and navigation.
//!
//! Nothing here renders markup; each component is a small state machine the
//! page containers and the API serialize.

pub mod action_menu;
pub mod card;
pub mod nav;
pub mod search;
pub mod slug;

pub use action_menu::{ActionCommand, ActionItem, ActionMenu, MenuInput, MenuState, Variant};
pub use card::{Card, CardEvent, CardInput, rating_label};
pub use nav::{NavBar, Section, UserMenu};
pub use search::SearchInput;
pub use slug::{book_path, movie_path, slug};
