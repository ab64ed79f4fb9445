//! Catalog browse and details commands

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::{CatalogArg, Credentials};
use crate::clients::{CatalogFeed, GoogleBooksClient, TmdbClient};
use crate::domain::{TmdbId, VolumeId};
use crate::models::{BookCategory, BookQuery, MovieCategory, MovieQuery};
use crate::pages::{ReviewForm, ReviewMode, books, movies};
use crate::state::SharedState;
use crate::ui::{ActionCommand, ActionMenu, SearchInput};

use super::{maybe_sign_in, print_grid};

pub async fn cmd_movies(
    state: &SharedState,
    category: Option<&str>,
    search: Option<String>,
    page: u32,
) -> anyhow::Result<()> {
    let query = match search {
        Some(term) => MovieQuery::search(term, page),
        None => {
            let category = category
                .map(str::parse::<MovieCategory>)
                .transpose()
                .map_err(anyhow::Error::msg)?
                .unwrap_or_default();
            MovieQuery::category(category, page)
        }
    };

    let feed = CatalogFeed::new(state.tmdb.clone());
    let view = movies::browse(&feed, query).await?;

    let title = heading(
        view.search.as_deref(),
        view.tabs.iter().map(|tab| (tab.label, tab.active)),
    );
    print_grid(&title, &view.results)
}

pub async fn cmd_books(
    state: &SharedState,
    category: Option<&str>,
    search: Option<String>,
    page: u32,
    per_page: Option<u32>,
) -> anyhow::Result<()> {
    let category = category
        .map(str::parse::<BookCategory>)
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or_default();
    let per_page = match per_page {
        Some(per_page) => per_page,
        None => state.config.read().await.google_books.default_page_size,
    };

    let feed = CatalogFeed::new(state.google_books.clone());
    let view = books::browse(
        &feed,
        BookQuery {
            category,
            search,
            page,
            per_page,
        },
    )
    .await?;

    let title = heading(
        view.search.as_deref(),
        view.tabs.iter().map(|tab| (tab.label, tab.active)),
    );
    print_grid(&title, &view.results)
}

/// Reads terms from stdin, searching once typing pauses for the configured debounce.
pub async fn cmd_search(state: &SharedState, catalog: CatalogArg) -> anyhow::Result<()> {
    let (ui, per_page) = {
        let config = state.config.read().await;
        (config.ui.clone(), config.google_books.default_page_size)
    };
    let movie_feed = CatalogFeed::new(state.tmdb.clone());
    let book_feed = CatalogFeed::new(state.google_books.clone());

    let (input, mut committed) = SearchInput::from_config(&ui);
    let mut input = Some(input);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_term = String::new();

    loop {
        tokio::select! {
            line = lines.next_line(), if input.is_some() => match line? {
                Some(line) => {
                    if let Some(search) = input.as_mut() {
                        search.set(line.trim());
                    }
                }
                // Dropping the input after the final commit closes the channel.
                None => {
                    if let Some(mut search) = input.take() {
                        search.submit();
                    }
                }
            },
            term = committed.recv() => {
                let Some(term) = term else { break };
                if term.is_empty() || term == last_term {
                    continue;
                }
                match catalog {
                    CatalogArg::Movies => search_movies(&movie_feed, &term).await?,
                    CatalogArg::Books => search_books(&book_feed, &term, per_page).await?,
                }
                last_term = term;
            }
        }
    }
    Ok(())
}

async fn search_movies(feed: &CatalogFeed<TmdbClient>, term: &str) -> anyhow::Result<()> {
    let view = movies::browse(feed, MovieQuery::search(term, 1)).await?;
    print_grid(&heading(Some(term), std::iter::empty::<(&str, bool)>()), &view.results)
}

async fn search_books(
    feed: &CatalogFeed<GoogleBooksClient>,
    term: &str,
    per_page: u32,
) -> anyhow::Result<()> {
    let query = BookQuery {
        search: Some(term.to_string()),
        per_page,
        ..BookQuery::default()
    };
    let view = books::browse(feed, query).await?;
    print_grid(&heading(Some(term), std::iter::empty::<(&str, bool)>()), &view.results)
}

pub async fn cmd_movie(
    state: &SharedState,
    credentials: &Credentials,
    id: i64,
) -> anyhow::Result<()> {
    let shelves = maybe_sign_in(state, credentials).await?;
    let view = movies::details(&state.tmdb, shelves.as_ref(), TmdbId::new(id)).await?;
    let movie = &view.movie;

    match &view.year {
        Some(year) => println!("{} ({year})", movie.title),
        None => println!("{}", movie.title),
    }
    if let Some(tagline) = &movie.tagline {
        println!("  \"{tagline}\"");
    }
    println!("{:-<70}", "");
    if let Some(rating) = &view.rating {
        println!("Valoración: {rating} ({} votos)", movie.vote_count.unwrap_or_default());
    }
    if let Some(runtime) = &view.runtime {
        println!("Duración:   {runtime}");
    }
    if !movie.genres.is_empty() {
        let genres: Vec<&str> = movie.genres.iter().map(|g| g.name.as_str()).collect();
        println!("Géneros:    {}", genres.join(", "));
    }
    if let Some(overview) = &movie.overview {
        println!();
        println!("{overview}");
    }

    if view.signed_in {
        println!();
        println!(
            "Por Ver: {} | Vista: {}",
            yes_no(view.membership.on_watchlist),
            yes_no(view.membership.watched)
        );
    }
    print_actions(view.actions.as_ref());
    print_review(view.review.as_ref());

    Ok(())
}

pub async fn cmd_book(
    state: &SharedState,
    credentials: &Credentials,
    id: &str,
) -> anyhow::Result<()> {
    let shelves = maybe_sign_in(state, credentials).await?;
    let view = books::details(&state.google_books, shelves.as_ref(), &VolumeId::new(id)).await?;
    let book = &view.book;

    println!("{}", book.title);
    if let Some(subtitle) = &book.subtitle {
        println!("  {subtitle}");
    }
    println!("{:-<70}", "");
    println!("Autores:    {}", view.authors);
    if let Some(rating) = &view.rating {
        println!("Valoración: {rating} ({} votos)", book.ratings_count.unwrap_or_default());
    }
    if let Some(pages) = book.page_count {
        println!("Páginas:    {pages}");
    }
    if let Some(publisher) = &book.publisher {
        println!("Editorial:  {publisher}");
    }
    if let Some(description) = &book.description {
        println!();
        println!("{description}");
    }

    if view.signed_in {
        let membership = view.membership;
        println!();
        println!(
            "Por Leer: {} | Leyendo: {} ({}%) | Leído: {}",
            yes_no(membership.to_read),
            yes_no(membership.reading),
            membership.progress,
            yes_no(membership.read)
        );
    }
    print_actions(view.actions.as_ref());
    print_review(view.review.as_ref());

    Ok(())
}

/// Category tabs with the active one bracketed, or the search heading.
fn heading<'a>(search: Option<&str>, tabs: impl Iterator<Item = (&'a str, bool)>) -> String {
    if let Some(term) = search {
        return format!("Resultados para \"{term}\"");
    }
    tabs.map(|(label, active)| {
        if active {
            format!("[{label}]")
        } else {
            label.to_string()
        }
    })
    .collect::<Vec<_>>()
    .join(" | ")
}

const fn yes_no(value: bool) -> &'static str {
    if value { "sí" } else { "no" }
}

fn print_actions<A: ActionCommand>(menu: Option<&ActionMenu<A>>) {
    let Some(menu) = menu else {
        return;
    };
    println!();
    println!("Acciones:");
    for item in menu.items() {
        println!("  • {}", item.label);
    }
}

fn print_review(form: Option<&ReviewForm>) {
    match form {
        Some(form) if form.mode == ReviewMode::Viewing => {
            println!();
            let stars = if form.rating > 0 {
                format!("{}/10", form.rating)
            } else {
                "sin calificación".to_string()
            };
            println!("Tu reseña ({stars}):");
            if !form.comment.is_empty() {
                println!("  {}", form.comment);
            }
        }
        Some(_) => {
            println!();
            println!("Aún no has reseñado este título.");
        }
        None => {}
    }
}
