//! Review command

use anyhow::Context;

use crate::cli::{Credentials, ReviewKind};
use crate::domain::{TmdbId, VolumeId};
use crate::pages::{ReviewForm, books, movies};
use crate::shelf::{ReviewRecord, ShelfStore};
use crate::state::SharedState;

use super::sign_in;

/// Starts from the stored review so omitted flags keep their current values.
fn form_for<R: ReviewRecord>(
    store: &ShelfStore<R>,
    key: &R::Key,
    rating: Option<u8>,
    comment: Option<String>,
) -> anyhow::Result<ReviewForm> {
    let mut form = ReviewForm::for_record(store.review(key).as_ref());
    form.edit();
    if let Some(rating) = rating {
        form.set_rating(rating);
    }
    if let Some(comment) = comment {
        form.set_comment(comment);
    }
    form.input().normalize().map_err(anyhow::Error::msg)?;
    Ok(form)
}

pub async fn cmd_review(
    state: &SharedState,
    credentials: &Credentials,
    kind: ReviewKind,
    id: &str,
    rating: Option<u8>,
    comment: Option<String>,
    delete: bool,
) -> anyhow::Result<()> {
    let shelves = sign_in(state, credentials).await?;

    match kind {
        ReviewKind::Movie => {
            let id: TmdbId = id
                .parse()
                .with_context(|| format!("'{id}' is not a TMDB movie id"))?;
            let store = &shelves.movie_reviews;
            store.ensure_loaded().await?;

            if delete {
                let mut form = ReviewForm::for_record(store.review(&id).as_ref());
                form.delete(store, &id).await?;
                println!("✓ Reseña eliminada");
                return Ok(());
            }

            let mut form = form_for(store, &id, rating, comment)?;
            let subject = movies::review_subject(&state.tmdb, &shelves, id).await?;
            let review = form.submit(store, subject).await?;
            println!("✓ Reseña guardada para {}", review.title);
        }
        ReviewKind::Book => {
            let id = VolumeId::new(id);
            let store = &shelves.book_reviews;
            store.ensure_loaded().await?;

            if delete {
                let mut form = ReviewForm::for_record(store.review(&id).as_ref());
                form.delete(store, &id).await?;
                println!("✓ Reseña eliminada");
                return Ok(());
            }

            let mut form = form_for(store, &id, rating, comment)?;
            let subject = books::review_subject(&state.google_books, &shelves, &id).await?;
            let review = form.submit(store, subject).await?;
            println!("✓ Reseña guardada para {}", review.title);
        }
    }

    Ok(())
}
