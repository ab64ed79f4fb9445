use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{CardGrid, PageError, PageState, ReviewForm, catalog_grid, date_label, shelf_page};
use crate::clients::{CatalogFeed, GoogleBooksClient};
use crate::domain::VolumeId;
use crate::models::book::authors_label;
use crate::models::{BookCategory, BookEntry, BookQuery, NewBookEntry, ReadingEntry, VolumeDetails};
use crate::shelf::Shelves;
use crate::ui::{ActionCommand, ActionItem, ActionMenu, Card, Variant, book_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookAction {
    AddToRead,
    StartReading,
    MarkRead,
    RemoveFromToRead,
    RemoveFromReading,
    RemoveFromRead,
}

impl BookAction {
    pub const ALL: [Self; 6] = [
        Self::AddToRead,
        Self::StartReading,
        Self::MarkRead,
        Self::RemoveFromToRead,
        Self::RemoveFromReading,
        Self::RemoveFromRead,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddToRead => "add_to_read",
            Self::StartReading => "start_reading",
            Self::MarkRead => "mark_read",
            Self::RemoveFromToRead => "remove_from_to_read",
            Self::RemoveFromReading => "remove_from_reading",
            Self::RemoveFromRead => "remove_from_read",
        }
    }
}

impl ActionCommand for BookAction {
    fn label(&self) -> &'static str {
        match self {
            Self::AddToRead => "Agregar a Por Leer",
            Self::StartReading => "Empezar a Leer",
            Self::MarkRead => "Marcar como Leído",
            Self::RemoveFromToRead => "Quitar de Por Leer",
            Self::RemoveFromReading => "Quitar de Leyendo",
            Self::RemoveFromRead => "Quitar de Leídos",
        }
    }

    fn variant(&self) -> Variant {
        match self {
            Self::AddToRead => Variant::Primary,
            Self::StartReading | Self::MarkRead => Variant::Secondary,
            Self::RemoveFromToRead | Self::RemoveFromReading | Self::RemoveFromRead => {
                Variant::Danger
            }
        }
    }
}

impl FromStr for BookAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown book action: {s}"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BookMembership {
    pub to_read: bool,
    pub reading: bool,
    pub read: bool,
    /// Percent read while on the reading shelf.
    pub progress: u8,
}

impl BookMembership {
    #[must_use]
    pub fn of(shelves: &Shelves, id: &VolumeId) -> Self {
        Self {
            to_read: shelves.books_to_read.contains(id),
            reading: shelves.books_reading.contains(id),
            read: shelves.books_read.contains(id),
            progress: shelves.books_reading.progress(id),
        }
    }
}

#[must_use]
pub fn book_actions(membership: BookMembership) -> ActionMenu<BookAction> {
    let commands: &[BookAction] = if membership.read {
        &[BookAction::RemoveFromRead]
    } else if membership.reading {
        &[BookAction::MarkRead, BookAction::RemoveFromReading]
    } else if membership.to_read {
        &[
            BookAction::StartReading,
            BookAction::MarkRead,
            BookAction::RemoveFromToRead,
        ]
    } else {
        &[
            BookAction::AddToRead,
            BookAction::StartReading,
            BookAction::MarkRead,
        ]
    };
    ActionMenu::new(commands.iter().copied().map(ActionItem::new).collect())
}

/// `"{p}% - Página {c} de {t}"`, or just the page without a total.
#[must_use]
pub fn progress_footer(entry: &ReadingEntry) -> String {
    match entry.total_pages.filter(|total| *total > 0) {
        Some(total) => format!(
            "{}% - Página {} de {}",
            entry.progress(),
            entry.current_page,
            total
        ),
        None => format!("Página {}", entry.current_page),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryTab {
    pub key: &'static str,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookBrowse {
    pub tabs: Vec<CategoryTab>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub results: PageState<CardGrid<BookAction>>,
}

pub async fn browse(
    feed: &CatalogFeed<GoogleBooksClient>,
    query: BookQuery,
) -> Result<BookBrowse, PageError> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(ToString::to_string);
    let tabs = BookCategory::ALL
        .into_iter()
        .map(|category| CategoryTab {
            key: category.as_str(),
            label: category.label(),
            active: search.is_none() && category == query.category,
        })
        .collect();

    let page = feed.fetch(query).await?;
    let hint = search.as_ref().map_or_else(
        || "No hay libros disponibles".to_string(),
        |term| format!("No se encontraron libros para \"{term}\""),
    );

    Ok(BookBrowse {
        tabs,
        search,
        results: catalog_grid(page, hint),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct BookDetailsView {
    pub book: VolumeDetails,
    pub authors: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    pub signed_in: bool,
    pub membership: BookMembership,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<ActionMenu<BookAction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewForm>,
}

pub async fn details(
    books: &GoogleBooksClient,
    shelves: Option<&Shelves>,
    id: &VolumeId,
) -> Result<BookDetailsView, PageError> {
    let book = books.details(id).await?;

    let (membership, actions, review) = match shelves {
        Some(shelves) => {
            tokio::try_join!(
                shelves.books_to_read.ensure_loaded(),
                shelves.books_reading.ensure_loaded(),
                shelves.books_read.ensure_loaded(),
                shelves.book_reviews.ensure_loaded(),
            )?;
            let membership = BookMembership::of(shelves, id);
            let review = ReviewForm::for_record(shelves.book_reviews.review(id).as_ref());
            (membership, Some(book_actions(membership)), Some(review))
        }
        None => (BookMembership::default(), None, None),
    };

    Ok(BookDetailsView {
        authors: authors_label(&book.authors),
        rating: book.average_rating.map(crate::ui::rating_label),
        signed_in: shelves.is_some(),
        membership,
        actions,
        review,
        book,
    })
}

fn base_card(
    id: &VolumeId,
    title: String,
    authors: &[String],
    thumbnail: Option<String>,
) -> Card<BookAction> {
    let href = book_path(id, &title);
    Card::new(id.clone(), title)
        .subtitle(Some(authors_label(authors)))
        .image(thumbnail)
        .href(href)
}

fn remove_menu(action: BookAction, extra: Option<BookAction>) -> ActionMenu<BookAction> {
    let mut items: Vec<_> = extra.into_iter().map(ActionItem::new).collect();
    items.push(ActionItem::new(action).labeled("Quitar"));
    ActionMenu::new(items)
}

fn entry_cards(
    rows: Vec<BookEntry>,
    footer: &str,
    remove: BookAction,
    next: Option<BookAction>,
) -> CardGrid<BookAction> {
    CardGrid::unpaged(
        rows.into_iter()
            .map(|entry| {
                base_card(&entry.google_books_id, entry.title, &entry.authors, entry.thumbnail)
                    .description(entry.description)
                    .footer(Some(format!("{footer} {}", date_label(&entry.listed_at))))
                    .actions(remove_menu(remove, next))
            })
            .collect(),
    )
}

pub async fn to_read(shelves: Option<&Shelves>) -> PageState<CardGrid<BookAction>> {
    let Some(shelves) = shelves else {
        return PageState::SignedOut;
    };

    shelf_page(&shelves.books_to_read, "Tu lista Por Leer está vacía", |rows| {
        entry_cards(
            rows,
            "Agregado el",
            BookAction::RemoveFromToRead,
            Some(BookAction::StartReading),
        )
    })
    .await
}

pub async fn reading(shelves: Option<&Shelves>) -> PageState<CardGrid<BookAction>> {
    let Some(shelves) = shelves else {
        return PageState::SignedOut;
    };

    shelf_page(&shelves.books_reading, "No estás leyendo ningún libro", |rows| {
        CardGrid::unpaged(
            rows.into_iter()
                .map(|entry| {
                    let footer = progress_footer(&entry);
                    base_card(&entry.google_books_id, entry.title, &entry.authors, entry.thumbnail)
                        .description(entry.description)
                        .footer(Some(footer))
                        .actions(remove_menu(
                            BookAction::RemoveFromReading,
                            Some(BookAction::MarkRead),
                        ))
                })
                .collect(),
        )
    })
    .await
}

pub async fn read(shelves: Option<&Shelves>) -> PageState<CardGrid<BookAction>> {
    let Some(shelves) = shelves else {
        return PageState::SignedOut;
    };

    shelf_page(&shelves.books_read, "Aún no has terminado ningún libro", |rows| {
        entry_cards(rows, "Terminado el", BookAction::RemoveFromRead, None)
    })
    .await
}

pub async fn reviews(shelves: Option<&Shelves>) -> PageState<CardGrid<BookAction>> {
    let Some(shelves) = shelves else {
        return PageState::SignedOut;
    };

    shelf_page(&shelves.book_reviews, "Aún no has escrito reseñas", |rows| {
        CardGrid::unpaged(
            rows.into_iter()
                .map(|review| {
                    base_card(&review.google_books_id, review.title, &review.authors, review.thumbnail)
                        .rating(review.rating.map(f64::from))
                        .description(review.comment)
                        .footer(Some(format!("Reseñado el {}", date_label(&review.updated_at))))
                })
                .collect(),
        )
    })
    .await
}

/// Fields for a new row, reusing any shelf row before asking Google Books.
///
/// The reading shelf needs a page count, so a draft without one is
/// completed from the volume details.
async fn draft_for(
    books: &GoogleBooksClient,
    shelves: &Shelves,
    id: &VolumeId,
    need_pages: bool,
) -> Result<NewBookEntry, PageError> {
    let cached = shelves
        .books_reading
        .get(id)
        .map(|entry| NewBookEntry::from(&entry))
        .or_else(|| shelves.books_to_read.get(id).map(|entry| NewBookEntry::from(&entry)))
        .or_else(|| shelves.books_read.get(id).map(|entry| NewBookEntry::from(&entry)))
        .or_else(|| {
            shelves.book_reviews.get(id).map(|review| {
                let mut draft = NewBookEntry::new(review.google_books_id, review.title);
                draft.authors = review.authors;
                draft.thumbnail = review.thumbnail;
                draft
            })
        });

    match cached {
        Some(draft) if !need_pages || draft.total_pages.is_some() => Ok(draft),
        cached => {
            let volume = books.details(id).await?;
            let mut draft = cached.unwrap_or_else(|| NewBookEntry {
                google_books_id: volume.id.clone(),
                title: volume.title.clone(),
                authors: volume.authors.clone(),
                thumbnail: volume.cover_url.clone(),
                description: volume.description.clone(),
                total_pages: None,
            });
            draft.total_pages = volume.page_count.filter(|pages| *pages > 0);
            Ok(draft)
        }
    }
}

pub async fn review_subject(
    books: &GoogleBooksClient,
    shelves: &Shelves,
    id: &VolumeId,
) -> Result<NewBookEntry, PageError> {
    draft_for(books, shelves, id, false).await
}

/// Runs a card action. Moves add to the target shelf, then remove from each source.
pub async fn run_action(
    books: &GoogleBooksClient,
    shelves: &Shelves,
    id: &VolumeId,
    action: BookAction,
) -> Result<BookMembership, PageError> {
    tokio::try_join!(
        shelves.books_to_read.ensure_loaded(),
        shelves.books_reading.ensure_loaded(),
        shelves.books_read.ensure_loaded(),
    )?;

    match action {
        BookAction::AddToRead => {
            let draft = draft_for(books, shelves, id, false).await?;
            shelves.books_to_read.add(draft).await?;
        }
        BookAction::StartReading => {
            let draft = draft_for(books, shelves, id, true).await?;
            shelves.books_reading.add(draft).await?;
            if shelves.books_to_read.contains(id) {
                shelves.books_to_read.remove(id).await?;
            }
        }
        BookAction::MarkRead => {
            let draft = draft_for(books, shelves, id, false).await?;
            shelves.books_read.add(draft).await?;
            if shelves.books_reading.contains(id) {
                shelves.books_reading.remove(id).await?;
            }
            if shelves.books_to_read.contains(id) {
                shelves.books_to_read.remove(id).await?;
            }
        }
        BookAction::RemoveFromToRead => shelves.books_to_read.remove(id).await?,
        BookAction::RemoveFromReading => shelves.books_reading.remove(id).await?,
        BookAction::RemoveFromRead => shelves.books_read.remove(id).await?,
    }

    info!(book = %id, action = action.as_str(), "Book action applied");
    Ok(BookMembership::of(shelves, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoogleBooksConfig;
    use crate::db::Store;
    use crate::domain::UserId;
    use crate::session::{Identity, Session};

    async fn shelves() -> Shelves {
        let store = Store::new("sqlite::memory:").await.unwrap();
        Shelves::new(Session::signed_in(Identity::new(UserId::new(1), "admin")), &store)
    }

    fn books() -> GoogleBooksClient {
        GoogleBooksClient::new(reqwest::Client::new(), &GoogleBooksConfig::default())
    }

    fn reading_entry(current_page: i32, total_pages: Option<i32>) -> ReadingEntry {
        ReadingEntry {
            id: 1,
            user_id: UserId::new(1),
            google_books_id: VolumeId::new("abc"),
            title: "Dune".into(),
            authors: vec![],
            thumbnail: None,
            description: None,
            current_page,
            total_pages,
            listed_at: String::new(),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_progress_footer() {
        assert_eq!(progress_footer(&reading_entry(40, Some(200))), "20% - Página 40 de 200");
        assert_eq!(progress_footer(&reading_entry(12, None)), "Página 12");
        assert_eq!(progress_footer(&reading_entry(12, Some(0))), "Página 12");
    }

    #[test]
    fn test_actions_reflect_membership() {
        let commands = |m| {
            book_actions(m)
                .items()
                .iter()
                .map(|item| item.command)
                .collect::<Vec<_>>()
        };

        assert_eq!(commands(BookMembership::default())[0], BookAction::AddToRead);
        assert_eq!(
            commands(BookMembership { reading: true, ..Default::default() }),
            [BookAction::MarkRead, BookAction::RemoveFromReading]
        );
        assert_eq!(
            commands(BookMembership { read: true, to_read: true, ..Default::default() }),
            [BookAction::RemoveFromRead]
        );
    }

    #[tokio::test]
    async fn test_mark_read_moves_from_to_read() {
        let shelves = shelves().await;
        let id = VolumeId::new("abc");

        shelves.books_to_read.load().await.unwrap();
        shelves
            .books_to_read
            .add(NewBookEntry::new(id.clone(), "Dune"))
            .await
            .unwrap();

        let membership = run_action(&books(), &shelves, &id, BookAction::MarkRead)
            .await
            .unwrap();

        assert!(membership.read);
        assert!(!membership.to_read);
        assert!(!membership.reading);
        assert_eq!(shelves.books_read.records()[0].title, "Dune");
    }

    #[tokio::test]
    async fn test_start_reading_keeps_known_page_count() {
        let shelves = shelves().await;
        let id = VolumeId::new("abc");

        shelves.books_reading.load().await.unwrap();
        let mut draft = NewBookEntry::new(id.clone(), "Dune");
        draft.total_pages = Some(412);
        shelves.books_reading.add(draft).await.unwrap();
        shelves.books_reading.update_progress(&id, 103).await.unwrap();

        let membership = BookMembership::of(&shelves, &id);
        assert!(membership.reading);
        assert_eq!(membership.progress, 25);

        let PageState::Ready(grid) = reading(Some(&shelves)).await else {
            panic!("expected cards");
        };
        assert_eq!(grid.cards[0].footer.as_deref(), Some("25% - Página 103 de 412"));
        assert_eq!(grid.cards[0].subtitle.as_deref(), Some("Autor desconocido"));
    }

    #[tokio::test]
    async fn test_signed_out_pages() {
        assert!(matches!(to_read(None).await, PageState::SignedOut));
        assert!(matches!(reading(None).await, PageState::SignedOut));
        assert!(matches!(read(None).await, PageState::SignedOut));
        assert!(matches!(reviews(None).await, PageState::SignedOut));
    }
}
