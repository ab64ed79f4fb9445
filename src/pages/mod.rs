//! Page containers: one function per route, composing clients, shelves and
//! view models into a [`PageState`].

use chrono::DateTime;
use serde::Serialize;
use thiserror::Error;

use crate::clients::MetadataError;
use crate::domain::ExternalId;
use crate::models::CatalogPage;
use crate::shelf::{LoadState, ShelfError, ShelfRecord, ShelfStore};
use crate::ui::{ActionCommand, Card, book_path, movie_path};

pub mod books;
pub mod movies;
pub mod reviews;

pub use reviews::{ReviewForm, ReviewMode};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum PageState<T> {
    Loading,
    SignedOut,
    Failed { message: String, dismissed: bool },
    Empty { hint: String },
    Ready(T),
}

impl<T> PageState<T> {
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            dismissed: false,
        }
    }

    /// Hides an error message; other states are untouched.
    pub fn dismiss(&mut self) {
        if let Self::Failed { dismissed, .. } = self {
            *dismissed = true;
        }
    }

    #[must_use]
    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Derives the page from a shelf's load state and cache.
    pub fn from_store<R: ShelfRecord>(
        store: &ShelfStore<R>,
        hint: &str,
        build: impl FnOnce(Vec<R>) -> T,
    ) -> Self {
        match store.state() {
            LoadState::Idle if store.session().identity().is_none() => Self::SignedOut,
            LoadState::Idle | LoadState::Loading => Self::Loading,
            LoadState::Error(message) => Self::failed(message),
            LoadState::Ready => {
                let records = store.records();
                if records.is_empty() {
                    Self::Empty {
                        hint: hint.to_string(),
                    }
                } else {
                    Self::Ready(build(records))
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Shelf(#[from] ShelfError),
}

/// Cards plus pagination, when the source is paged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardGrid<A> {
    pub cards: Vec<Card<A>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u32>,
}

impl<A> CardGrid<A> {
    #[must_use]
    pub const fn unpaged(cards: Vec<Card<A>>) -> Self {
        Self {
            cards,
            page: None,
            total_pages: None,
            total_items: None,
        }
    }
}

/// Ensures the shelf is loaded, then renders it.
pub async fn shelf_page<R: ShelfRecord, T>(
    store: &ShelfStore<R>,
    hint: &str,
    build: impl FnOnce(Vec<R>) -> T,
) -> PageState<T> {
    // A failure is kept in the load state and rendered below.
    let _ = store.ensure_loaded().await;
    PageState::from_store(store, hint, build)
}

/// Grid of a browse result; `Empty` when nothing matched.
pub fn catalog_grid<A: ActionCommand>(
    page: CatalogPage,
    hint: impl Into<String>,
) -> PageState<CardGrid<A>> {
    if page.is_empty() {
        return PageState::Empty { hint: hint.into() };
    }

    let cards = page
        .items
        .into_iter()
        .map(|item| {
            let href = item_path(&item.id, &item.title);
            let votes = item
                .rating_count
                .filter(|count| *count > 0)
                .map(|count| format!("{count} votos"));
            Card::new(item.id, item.title)
                .subtitle(item.subtitle)
                .image(item.image_url)
                .description(item.description)
                .rating(item.rating)
                .footer(votes)
                .href(href)
        })
        .collect();

    PageState::Ready(CardGrid {
        cards,
        page: Some(page.page),
        total_pages: Some(page.total_pages),
        total_items: Some(page.total_items),
    })
}

#[must_use]
pub fn item_path(id: &ExternalId, title: &str) -> String {
    match id {
        ExternalId::Movie(id) => movie_path(*id, title),
        ExternalId::Book(id) => book_path(id, title),
    }
}

/// `dd/mm/yyyy` for a stored timestamp; unparsable values are shown as stored.
#[must_use]
pub fn date_label(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp).map_or_else(
        |_| timestamp.to_string(),
        |date| date.format("%d/%m/%Y").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TmdbId, VolumeId};
    use crate::models::CatalogItem;
    use crate::pages::movies::MovieAction;

    #[test]
    fn test_date_label() {
        assert_eq!(date_label("2026-02-01T10:30:00.000000Z"), "01/02/2026");
        assert_eq!(date_label("ayer"), "ayer");
    }

    #[test]
    fn test_dismiss_only_affects_errors() {
        let mut state: PageState<()> = PageState::failed("boom");
        state.dismiss();
        assert_eq!(
            state,
            PageState::Failed {
                message: "boom".into(),
                dismissed: true
            }
        );

        let mut ready = PageState::Ready(1);
        ready.dismiss();
        assert_eq!(ready.ready(), Some(&1));
    }

    #[test]
    fn test_catalog_grid_cards() {
        let page = CatalogPage {
            items: vec![CatalogItem {
                id: TmdbId::new(603).into(),
                title: "Matrix".into(),
                subtitle: Some("1999".into()),
                image_url: None,
                description: Some(String::new()),
                rating: Some(8.2),
                rating_count: Some(25_000),
            }],
            page: 1,
            total_pages: 3,
            total_items: 55,
        };

        let PageState::Ready(grid) = catalog_grid::<MovieAction>(page, "nada") else {
            panic!("expected cards");
        };
        let card = &grid.cards[0];
        assert_eq!(card.href.as_deref(), Some("/movies/matrix?id=603"));
        assert_eq!(card.footer.as_deref(), Some("25000 votos"));
        assert_eq!(card.description, None);
        assert_eq!(grid.total_pages, Some(3));
    }

    #[test]
    fn test_empty_catalog_has_hint() {
        let state = catalog_grid::<MovieAction>(CatalogPage::empty(1), "Sin resultados");
        assert_eq!(
            state,
            PageState::Empty {
                hint: "Sin resultados".into()
            }
        );
        assert_eq!(
            item_path(&VolumeId::new("x y").into(), "Dune"),
            "/books/dune?id=x%20y"
        );
    }
}
