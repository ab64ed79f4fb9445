use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::TmdbId;
use crate::models::{
    MovieCategory, MovieEntry, MovieQuery, MovieReview, NewMovieEntry, ReviewInput,
};
use crate::pages::movies::{self, MovieAction, MovieBrowse, MovieDetailsView, MovieMembership};
use crate::pages::{CardGrid, PageState, ReviewForm};
use crate::shelf::ShelfStore;

type MovieGrid = PageState<CardGrid<MovieAction>>;

#[derive(Debug, Deserialize)]
pub struct BrowseParams {
    pub category: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
    /// Client-chosen feed; a newer request on the same feed supersedes older ones.
    pub feed: Option<String>,
}

impl BrowseParams {
    fn query(&self) -> Result<MovieQuery, ApiError> {
        let page = self.page.unwrap_or(1);
        if let Some(term) = self.q.as_deref().filter(|q| !q.trim().is_empty()) {
            return Ok(MovieQuery::search(term, page));
        }
        let category = self
            .category
            .as_deref()
            .map(str::parse::<MovieCategory>)
            .transpose()
            .map_err(ApiError::validation)?
            .unwrap_or_default();
        Ok(MovieQuery::category(category, page))
    }
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: MovieAction,
}

/// GET /movies
pub async fn browse(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<ApiResponse<MovieBrowse>>, ApiError> {
    let query = params.query()?;
    let feed = state.movie_feeds().feed(params.feed.as_deref());
    let view = movies::browse(&feed, query).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// GET /movies/{id}
pub async fn details(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MovieDetailsView>>, ApiError> {
    let shelves = user.shelves(&state);
    let view = movies::details(state.tmdb(), shelves.as_deref(), TmdbId::new(id)).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// GET /movies/watchlist
pub async fn watchlist(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<MovieGrid>> {
    let shelves = user.shelves(&state);
    Json(ApiResponse::success(
        movies::watchlist(state.tmdb(), shelves.as_deref()).await,
    ))
}

/// GET /movies/watched
pub async fn watched(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<MovieGrid>> {
    let shelves = user.shelves(&state);
    Json(ApiResponse::success(
        movies::watched(state.tmdb(), shelves.as_deref()).await,
    ))
}

/// GET /movies/reviews
pub async fn reviews(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<MovieGrid>> {
    let shelves = user.shelves(&state);
    Json(ApiResponse::success(
        movies::reviews(state.tmdb(), shelves.as_deref()).await,
    ))
}

async fn add_to(
    store: &ShelfStore<MovieEntry>,
    entry: NewMovieEntry,
) -> Result<Json<ApiResponse<MovieEntry>>, ApiError> {
    let row = store.add(entry).await?;
    Ok(Json(ApiResponse::success(row)))
}

async fn remove_from(
    store: &ShelfStore<MovieEntry>,
    id: i64,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    store.remove(&TmdbId::new(id)).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Película {id} eliminada de {}",
        store.name()
    )))))
}

/// POST /movies/watchlist
pub async fn add_to_watchlist(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(entry): Json<NewMovieEntry>,
) -> Result<Json<ApiResponse<MovieEntry>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    add_to(&shelves.movies_to_watch, entry).await
}

/// DELETE /movies/watchlist/{id}
pub async fn remove_from_watchlist(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    remove_from(&shelves.movies_to_watch, id).await
}

/// POST /movies/watched
pub async fn add_to_watched(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(entry): Json<NewMovieEntry>,
) -> Result<Json<ApiResponse<MovieEntry>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    add_to(&shelves.movies_watched, entry).await
}

/// DELETE /movies/watched/{id}
pub async fn remove_from_watched(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    remove_from(&shelves.movies_watched, id).await
}

/// POST /movies/{id}/actions
pub async fn run_action(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<ApiResponse<MovieMembership>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    let membership =
        movies::run_action(state.tmdb(), &shelves, TmdbId::new(id), request.action).await?;
    Ok(Json(ApiResponse::success(membership)))
}

/// GET /movies/{id}/review
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ReviewForm>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    shelves.movie_reviews.ensure_loaded().await?;
    let review = shelves.movie_reviews.review(&TmdbId::new(id));
    Ok(Json(ApiResponse::success(ReviewForm::for_record(
        review.as_ref(),
    ))))
}

/// PUT /movies/{id}/review
pub async fn save_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(input): Json<ReviewInput>,
) -> Result<Json<ApiResponse<MovieReview>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    // Reject empty reviews before any lookup of the subject.
    input.normalize().map_err(ApiError::validation)?;

    tokio::try_join!(
        shelves.movie_reviews.ensure_loaded(),
        shelves.movies_to_watch.ensure_loaded(),
        shelves.movies_watched.ensure_loaded(),
    )?;
    let subject = movies::review_subject(state.tmdb(), &shelves, TmdbId::new(id)).await?;
    let review = shelves.movie_reviews.save(subject, &input).await?;
    Ok(Json(ApiResponse::success(review)))
}

/// DELETE /movies/{id}/review
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    shelves.movie_reviews.remove(&TmdbId::new(id)).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Reseña eliminada",
    ))))
}
