mod browse;
mod reviews;
mod shelves;
mod users;

pub use browse::{cmd_book, cmd_books, cmd_movie, cmd_movies, cmd_search};
pub use reviews::cmd_review;
pub use shelves::{cmd_add, cmd_list, cmd_progress, cmd_remove};
pub use users::cmd_user_add;

use anyhow::{Context, bail};

use super::Credentials;
use crate::pages::{CardGrid, PageState};
use crate::session::Session;
use crate::shelf::Shelves;
use crate::state::SharedState;
use crate::ui::ActionCommand;

/// Signs in and builds the user's shelves.
async fn sign_in(state: &SharedState, credentials: &Credentials) -> anyhow::Result<Shelves> {
    let (Some(user), Some(password)) = (&credentials.user, &credentials.password) else {
        bail!("This command needs --user and --password (or MEDIASHELF_USER and MEDIASHELF_PASSWORD)");
    };

    let session = Session::new();
    session
        .sign_in(state.auth.as_ref(), user, password)
        .await
        .context("Sign-in failed")?;
    Ok(Shelves::new(session, &state.store))
}

/// Signs in only when credentials were given.
async fn maybe_sign_in(
    state: &SharedState,
    credentials: &Credentials,
) -> anyhow::Result<Option<Shelves>> {
    if credentials.user.is_none() {
        return Ok(None);
    }
    sign_in(state, credentials).await.map(Some)
}

fn print_grid<A: ActionCommand>(title: &str, page: &PageState<CardGrid<A>>) -> anyhow::Result<()> {
    println!("{title}");
    println!("{:-<70}", "");

    match page {
        PageState::Loading => println!("Cargando…"),
        PageState::SignedOut => println!("Inicia sesión para ver tus listas."),
        PageState::Failed { message, .. } => bail!("{message}"),
        PageState::Empty { hint } => println!("{hint}"),
        PageState::Ready(grid) => {
            for card in &grid.cards {
                println!("{}", card.render_text());
            }
            if let (Some(page), Some(total_pages)) = (grid.page, grid.total_pages) {
                println!();
                println!(
                    "Página {page} de {total_pages} ({} resultados)",
                    grid.total_items.unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}
