use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{CardGrid, PageError, PageState, ReviewForm, catalog_grid, date_label, shelf_page};
use crate::clients::{CatalogFeed, TmdbClient};
use crate::domain::TmdbId;
use crate::models::{
    ImageSize, MovieCategory, MovieDetails, MovieEntry, MovieQuery, MovieReview, NewMovieEntry,
};
use crate::shelf::Shelves;
use crate::ui::{ActionCommand, ActionItem, ActionMenu, Card, Variant, movie_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieAction {
    AddToWatchlist,
    MarkWatched,
    RemoveFromWatchlist,
    RemoveFromWatched,
}

impl MovieAction {
    pub const ALL: [Self; 4] = [
        Self::AddToWatchlist,
        Self::MarkWatched,
        Self::RemoveFromWatchlist,
        Self::RemoveFromWatched,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddToWatchlist => "add_to_watchlist",
            Self::MarkWatched => "mark_watched",
            Self::RemoveFromWatchlist => "remove_from_watchlist",
            Self::RemoveFromWatched => "remove_from_watched",
        }
    }
}

impl ActionCommand for MovieAction {
    fn label(&self) -> &'static str {
        match self {
            Self::AddToWatchlist => "Agregar a Por Ver",
            Self::MarkWatched => "Marcar como Vista",
            Self::RemoveFromWatchlist => "Quitar de Por Ver",
            Self::RemoveFromWatched => "Quitar de Vistas",
        }
    }

    fn variant(&self) -> Variant {
        match self {
            Self::AddToWatchlist => Variant::Primary,
            Self::MarkWatched => Variant::Secondary,
            Self::RemoveFromWatchlist | Self::RemoveFromWatched => Variant::Danger,
        }
    }
}

impl FromStr for MovieAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown movie action: {s}"))
    }
}

/// Where a movie currently sits for the signed-in user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MovieMembership {
    pub on_watchlist: bool,
    pub watched: bool,
}

impl MovieMembership {
    #[must_use]
    pub fn of(shelves: &Shelves, id: TmdbId) -> Self {
        Self {
            on_watchlist: shelves.movies_to_watch.contains(&id),
            watched: shelves.movies_watched.contains(&id),
        }
    }
}

/// Actions offered on a details page for the given membership.
#[must_use]
pub fn movie_actions(membership: MovieMembership) -> ActionMenu<MovieAction> {
    let commands: &[MovieAction] = if membership.watched {
        &[MovieAction::RemoveFromWatched]
    } else if membership.on_watchlist {
        &[MovieAction::MarkWatched, MovieAction::RemoveFromWatchlist]
    } else {
        &[MovieAction::AddToWatchlist, MovieAction::MarkWatched]
    };
    ActionMenu::new(commands.iter().copied().map(ActionItem::new).collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryTab {
    pub key: &'static str,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieBrowse {
    pub tabs: Vec<CategoryTab>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub results: PageState<CardGrid<MovieAction>>,
}

/// Category tabs or search results, one page at a time.
pub async fn browse(
    feed: &CatalogFeed<TmdbClient>,
    query: MovieQuery,
) -> Result<MovieBrowse, PageError> {
    let search = query.search_term().map(ToString::to_string);
    let tabs = MovieCategory::ALL
        .into_iter()
        .map(|category| CategoryTab {
            key: category.as_str(),
            label: category.label(),
            active: search.is_none() && category == query.category,
        })
        .collect();

    let page = feed.fetch(query).await?;
    let hint = search.as_ref().map_or_else(
        || "No hay películas disponibles".to_string(),
        |term| format!("No se encontraron películas para \"{term}\""),
    );

    Ok(MovieBrowse {
        tabs,
        search,
        results: catalog_grid(page, hint),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieDetailsView {
    pub movie: MovieDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    pub signed_in: bool,
    pub membership: MovieMembership,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<ActionMenu<MovieAction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewForm>,
}

pub async fn details(
    tmdb: &TmdbClient,
    shelves: Option<&Shelves>,
    id: TmdbId,
) -> Result<MovieDetailsView, PageError> {
    let movie = tmdb.details(id).await?;

    let (membership, actions, review) = match shelves {
        Some(shelves) => {
            tokio::try_join!(
                shelves.movies_to_watch.ensure_loaded(),
                shelves.movies_watched.ensure_loaded(),
                shelves.movie_reviews.ensure_loaded(),
            )?;
            let membership = MovieMembership::of(shelves, id);
            let review = ReviewForm::for_record(shelves.movie_reviews.review(&id).as_ref());
            (membership, Some(movie_actions(membership)), Some(review))
        }
        None => (MovieMembership::default(), None, None),
    };

    Ok(MovieDetailsView {
        year: movie.year().map(ToString::to_string),
        runtime: movie.runtime_label(),
        rating: movie.vote_average.map(crate::ui::rating_label),
        signed_in: shelves.is_some(),
        membership,
        actions,
        review,
        movie,
    })
}

fn entry_card(entry: MovieEntry, tmdb: &TmdbClient, footer: String) -> Card<MovieAction> {
    let href = movie_path(entry.tmdb_id, &entry.title);
    Card::new(entry.tmdb_id, entry.title)
        .image(Some(tmdb.image_url(entry.poster_path.as_deref(), ImageSize::W500)))
        .description(entry.description)
        .footer(Some(footer))
        .href(href)
}

pub async fn watchlist(
    tmdb: &TmdbClient,
    shelves: Option<&Shelves>,
) -> PageState<CardGrid<MovieAction>> {
    let Some(shelves) = shelves else {
        return PageState::SignedOut;
    };

    shelf_page(&shelves.movies_to_watch, "Tu lista Por Ver está vacía", |rows| {
        CardGrid::unpaged(
            rows.into_iter()
                .map(|entry| {
                    let footer = format!("Agregada el {}", date_label(&entry.listed_at));
                    entry_card(entry, tmdb, footer).actions(ActionMenu::new(vec![
                        ActionItem::new(MovieAction::MarkWatched),
                        ActionItem::new(MovieAction::RemoveFromWatchlist).labeled("Quitar"),
                    ]))
                })
                .collect(),
        )
    })
    .await
}

pub async fn watched(
    tmdb: &TmdbClient,
    shelves: Option<&Shelves>,
) -> PageState<CardGrid<MovieAction>> {
    let Some(shelves) = shelves else {
        return PageState::SignedOut;
    };

    shelf_page(&shelves.movies_watched, "Aún no has marcado películas como vistas", |rows| {
        CardGrid::unpaged(
            rows.into_iter()
                .map(|entry| {
                    let footer = format!("Vista el {}", date_label(&entry.listed_at));
                    entry_card(entry, tmdb, footer).actions(ActionMenu::new(vec![
                        ActionItem::new(MovieAction::RemoveFromWatched).labeled("Quitar"),
                    ]))
                })
                .collect(),
        )
    })
    .await
}

pub async fn reviews(
    tmdb: &TmdbClient,
    shelves: Option<&Shelves>,
) -> PageState<CardGrid<MovieAction>> {
    let Some(shelves) = shelves else {
        return PageState::SignedOut;
    };

    shelf_page(&shelves.movie_reviews, "Aún no has escrito reseñas", |rows| {
        CardGrid::unpaged(
            rows.into_iter()
                .map(|review: MovieReview| {
                    let href = movie_path(review.tmdb_id, &review.title);
                    Card::new(review.tmdb_id, review.title)
                        .image(Some(
                            tmdb.image_url(review.poster_path.as_deref(), ImageSize::W500),
                        ))
                        .rating(review.rating.map(f64::from))
                        .description(review.comment)
                        .footer(Some(format!("Reseñada el {}", date_label(&review.updated_at))))
                        .href(href)
                })
                .collect(),
        )
    })
    .await
}

/// Fields for a new row: from any shelf already holding the movie, else from TMDB.
async fn draft_for(
    tmdb: &TmdbClient,
    shelves: &Shelves,
    id: TmdbId,
) -> Result<NewMovieEntry, PageError> {
    if let Some(entry) = shelves
        .movies_to_watch
        .get(&id)
        .or_else(|| shelves.movies_watched.get(&id))
    {
        return Ok(NewMovieEntry::from(&entry));
    }
    if let Some(review) = shelves.movie_reviews.get(&id) {
        return Ok(NewMovieEntry {
            tmdb_id: review.tmdb_id,
            title: review.title,
            poster_path: review.poster_path,
            description: None,
        });
    }

    let movie = tmdb.details(id).await?;
    Ok(NewMovieEntry {
        tmdb_id: movie.id,
        title: movie.title,
        poster_path: movie.poster_path,
        description: movie.overview,
    })
}

/// Review subject for `id`, built the same way as shelf rows.
pub async fn review_subject(
    tmdb: &TmdbClient,
    shelves: &Shelves,
    id: TmdbId,
) -> Result<NewMovieEntry, PageError> {
    draft_for(tmdb, shelves, id).await
}

/// Runs a card action. Moves add to the target shelf, then remove from the source.
pub async fn run_action(
    tmdb: &TmdbClient,
    shelves: &Shelves,
    id: TmdbId,
    action: MovieAction,
) -> Result<MovieMembership, PageError> {
    tokio::try_join!(
        shelves.movies_to_watch.ensure_loaded(),
        shelves.movies_watched.ensure_loaded(),
    )?;

    match action {
        MovieAction::AddToWatchlist => {
            let draft = draft_for(tmdb, shelves, id).await?;
            shelves.movies_to_watch.add(draft).await?;
        }
        MovieAction::MarkWatched => {
            let draft = draft_for(tmdb, shelves, id).await?;
            shelves.movies_watched.add(draft).await?;
            if shelves.movies_to_watch.contains(&id) {
                shelves.movies_to_watch.remove(&id).await?;
            }
        }
        MovieAction::RemoveFromWatchlist => shelves.movies_to_watch.remove(&id).await?,
        MovieAction::RemoveFromWatched => shelves.movies_watched.remove(&id).await?,
    }

    info!(movie = %id, action = action.as_str(), "Movie action applied");
    Ok(MovieMembership::of(shelves, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TmdbConfig;
    use crate::db::Store;
    use crate::domain::UserId;
    use crate::session::{Identity, Session};
    use crate::ui::MenuInput;

    async fn shelves() -> Shelves {
        let store = Store::new("sqlite::memory:").await.unwrap();
        Shelves::new(Session::signed_in(Identity::new(UserId::new(1), "admin")), &store)
    }

    fn tmdb() -> TmdbClient {
        TmdbClient::new(reqwest::Client::new(), &TmdbConfig::default())
    }

    #[test]
    fn test_actions_reflect_membership() {
        let labels = |m| {
            movie_actions(m)
                .items()
                .iter()
                .map(|item| item.command)
                .collect::<Vec<_>>()
        };

        assert_eq!(
            labels(MovieMembership::default()),
            [MovieAction::AddToWatchlist, MovieAction::MarkWatched]
        );
        assert_eq!(
            labels(MovieMembership { on_watchlist: true, watched: false }),
            [MovieAction::MarkWatched, MovieAction::RemoveFromWatchlist]
        );
        assert_eq!(
            labels(MovieMembership { on_watchlist: true, watched: true }),
            [MovieAction::RemoveFromWatched]
        );
    }

    #[test]
    fn test_action_round_trips_through_str() {
        for action in MovieAction::ALL {
            assert_eq!(action.as_str().parse::<MovieAction>(), Ok(action));
        }
        assert!("explode".parse::<MovieAction>().is_err());
    }

    #[tokio::test]
    async fn test_mark_watched_moves_from_watchlist() {
        let shelves = shelves().await;
        let tmdb = tmdb();
        let id = TmdbId::new(603);

        shelves.movies_to_watch.load().await.unwrap();
        shelves
            .movies_to_watch
            .add(NewMovieEntry::new(id, "Matrix"))
            .await
            .unwrap();

        // The draft comes from the watchlist row, so TMDB is never called.
        let membership = run_action(&tmdb, &shelves, id, MovieAction::MarkWatched)
            .await
            .unwrap();

        assert_eq!(membership, MovieMembership { on_watchlist: false, watched: true });
        assert_eq!(shelves.movies_watched.records()[0].title, "Matrix");
    }

    #[tokio::test]
    async fn test_add_without_catalog_key_surfaces_configuration_error() {
        let shelves = shelves().await;

        let err = run_action(&tmdb(), &shelves, TmdbId::new(1), MovieAction::AddToWatchlist)
            .await
            .unwrap_err();

        assert!(matches!(err, PageError::Metadata(crate::clients::MetadataError::Configuration(_))));
        assert!(shelves.movies_to_watch.records().is_empty());
    }

    #[tokio::test]
    async fn test_watchlist_page_states() {
        let tmdb = tmdb();
        assert!(matches!(watchlist(&tmdb, None).await, PageState::SignedOut));

        let shelves = shelves().await;
        assert!(matches!(
            watchlist(&tmdb, Some(&shelves)).await,
            PageState::Empty { .. }
        ));

        shelves
            .movies_to_watch
            .add(NewMovieEntry::new(TmdbId::new(603), "Matrix"))
            .await
            .unwrap();
        let PageState::Ready(mut grid) = watchlist(&tmdb, Some(&shelves)).await else {
            panic!("expected cards");
        };
        let card = &mut grid.cards[0];
        assert!(card.footer.as_deref().unwrap().starts_with("Agregada el "));
        assert_eq!(
            card.image_url.as_deref(),
            Some(crate::models::movie::PLACEHOLDER_POSTER)
        );

        let menu = card.actions.as_mut().unwrap();
        menu.handle(MenuInput::Toggle);
        let (index, item) = menu.visible_options().next().unwrap();
        assert_eq!(item.label, "Quitar");
        assert_eq!(
            menu.handle(MenuInput::Select(index)),
            Some(MovieAction::RemoveFromWatchlist)
        );
    }
}
