//! Shelf commands: list, add, remove and reading progress

use anyhow::{Context, bail};

use crate::cli::{Credentials, ShelfArg};
use crate::domain::{TmdbId, VolumeId};
use crate::pages::books::{self, BookAction, BookMembership, progress_footer};
use crate::pages::movies::{self, MovieAction, MovieMembership};
use crate::state::SharedState;

use super::{print_grid, sign_in};

impl ShelfArg {
    const fn title(self) -> &'static str {
        match self {
            Self::ToWatch => "Por Ver",
            Self::Watched => "Ya Vistas",
            Self::MovieReviews => "Reseñas de Películas",
            Self::ToRead => "Por Leer",
            Self::Reading => "Leyendo",
            Self::Read => "Leídos",
            Self::BookReviews => "Reseñas de Libros",
        }
    }
}

fn tmdb_id(id: &str) -> anyhow::Result<TmdbId> {
    id.parse()
        .with_context(|| format!("'{id}' is not a TMDB movie id"))
}

fn print_movie(membership: MovieMembership) {
    println!(
        "✓ Por Ver: {} | Vista: {}",
        if membership.on_watchlist { "sí" } else { "no" },
        if membership.watched { "sí" } else { "no" }
    );
}

fn print_book(membership: BookMembership) {
    println!(
        "✓ Por Leer: {} | Leyendo: {} | Leído: {}",
        if membership.to_read { "sí" } else { "no" },
        if membership.reading { "sí" } else { "no" },
        if membership.read { "sí" } else { "no" }
    );
}

pub async fn cmd_list(
    state: &SharedState,
    credentials: &Credentials,
    shelf: ShelfArg,
) -> anyhow::Result<()> {
    let shelves = sign_in(state, credentials).await?;
    let tmdb = &state.tmdb;

    match shelf {
        ShelfArg::ToWatch => print_grid(shelf.title(), &movies::watchlist(tmdb, Some(&shelves)).await),
        ShelfArg::Watched => print_grid(shelf.title(), &movies::watched(tmdb, Some(&shelves)).await),
        ShelfArg::MovieReviews => {
            print_grid(shelf.title(), &movies::reviews(tmdb, Some(&shelves)).await)
        }
        ShelfArg::ToRead => print_grid(shelf.title(), &books::to_read(Some(&shelves)).await),
        ShelfArg::Reading => print_grid(shelf.title(), &books::reading(Some(&shelves)).await),
        ShelfArg::Read => print_grid(shelf.title(), &books::read(Some(&shelves)).await),
        ShelfArg::BookReviews => print_grid(shelf.title(), &books::reviews(Some(&shelves)).await),
    }
}

pub async fn cmd_add(
    state: &SharedState,
    credentials: &Credentials,
    shelf: ShelfArg,
    id: &str,
) -> anyhow::Result<()> {
    let movie_action = match shelf {
        ShelfArg::ToWatch => Some(MovieAction::AddToWatchlist),
        ShelfArg::Watched => Some(MovieAction::MarkWatched),
        _ => None,
    };
    let book_action = match shelf {
        ShelfArg::ToRead => Some(BookAction::AddToRead),
        ShelfArg::Reading => Some(BookAction::StartReading),
        ShelfArg::Read => Some(BookAction::MarkRead),
        _ => None,
    };
    run(state, credentials, id, movie_action, book_action).await
}

pub async fn cmd_remove(
    state: &SharedState,
    credentials: &Credentials,
    shelf: ShelfArg,
    id: &str,
) -> anyhow::Result<()> {
    match shelf {
        ShelfArg::MovieReviews | ShelfArg::BookReviews => {
            let shelves = sign_in(state, credentials).await?;
            if shelf == ShelfArg::MovieReviews {
                shelves.movie_reviews.remove(&tmdb_id(id)?).await?;
            } else {
                shelves.book_reviews.remove(&VolumeId::new(id)).await?;
            }
            println!("✓ Reseña eliminada");
            Ok(())
        }
        _ => {
            let movie_action = match shelf {
                ShelfArg::ToWatch => Some(MovieAction::RemoveFromWatchlist),
                ShelfArg::Watched => Some(MovieAction::RemoveFromWatched),
                _ => None,
            };
            let book_action = match shelf {
                ShelfArg::ToRead => Some(BookAction::RemoveFromToRead),
                ShelfArg::Reading => Some(BookAction::RemoveFromReading),
                ShelfArg::Read => Some(BookAction::RemoveFromRead),
                _ => None,
            };
            run(state, credentials, id, movie_action, book_action).await
        }
    }
}

async fn run(
    state: &SharedState,
    credentials: &Credentials,
    id: &str,
    movie_action: Option<MovieAction>,
    book_action: Option<BookAction>,
) -> anyhow::Result<()> {
    match (movie_action, book_action) {
        (Some(action), _) => {
            let id = tmdb_id(id)?;
            let shelves = sign_in(state, credentials).await?;
            let membership = movies::run_action(&state.tmdb, &shelves, id, action).await?;
            print_movie(membership);
        }
        (None, Some(action)) => {
            let shelves = sign_in(state, credentials).await?;
            let membership =
                books::run_action(&state.google_books, &shelves, &VolumeId::new(id), action)
                    .await?;
            print_book(membership);
        }
        (None, None) => bail!("Reviews are written with `mediashelf review`"),
    }
    Ok(())
}

pub async fn cmd_progress(
    state: &SharedState,
    credentials: &Credentials,
    id: &str,
    page: i32,
) -> anyhow::Result<()> {
    let shelves = sign_in(state, credentials).await?;
    shelves.books_reading.ensure_loaded().await?;
    let row = shelves
        .books_reading
        .update_progress(&VolumeId::new(id), page)
        .await?;

    println!("✓ {}: {}", row.title, progress_footer(&row));
    Ok(())
}
