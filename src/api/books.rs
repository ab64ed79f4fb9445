use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::VolumeId;
use crate::models::{
    BookCategory, BookEntry, BookQuery, BookReview, NewBookEntry, ReadingEntry, ReviewInput,
};
use crate::pages::books::{self, BookAction, BookBrowse, BookDetailsView, BookMembership};
use crate::pages::{CardGrid, PageState, ReviewForm};
use crate::shelf::ShelfStore;

type BookGrid = PageState<CardGrid<BookAction>>;

#[derive(Debug, Deserialize)]
pub struct BrowseParams {
    pub category: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub feed: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: BookAction,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub current_page: i32,
}

/// GET /books
pub async fn browse(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<ApiResponse<BookBrowse>>, ApiError> {
    let category = params
        .category
        .as_deref()
        .map(str::parse::<BookCategory>)
        .transpose()
        .map_err(ApiError::validation)?
        .unwrap_or_default();
    let per_page = match params.per_page {
        Some(per_page) => per_page,
        None => state.config().read().await.google_books.default_page_size,
    };

    let query = BookQuery {
        category,
        search: params.q,
        page: params.page.unwrap_or(1),
        per_page,
    };
    let feed = state.book_feeds().feed(params.feed.as_deref());
    let view = books::browse(&feed, query).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// GET /books/{id}
pub async fn details(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BookDetailsView>>, ApiError> {
    let shelves = user.shelves(&state);
    let view = books::details(state.google_books(), shelves.as_deref(), &VolumeId::new(id)).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// GET /books/to-read
pub async fn to_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<BookGrid>> {
    let shelves = user.shelves(&state);
    Json(ApiResponse::success(books::to_read(shelves.as_deref()).await))
}

/// GET /books/reading
pub async fn reading(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<BookGrid>> {
    let shelves = user.shelves(&state);
    Json(ApiResponse::success(books::reading(shelves.as_deref()).await))
}

/// GET /books/read
pub async fn read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<BookGrid>> {
    let shelves = user.shelves(&state);
    Json(ApiResponse::success(books::read(shelves.as_deref()).await))
}

/// GET /books/reviews
pub async fn reviews(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<BookGrid>> {
    let shelves = user.shelves(&state);
    Json(ApiResponse::success(books::reviews(shelves.as_deref()).await))
}

async fn add_to(
    store: &ShelfStore<BookEntry>,
    entry: NewBookEntry,
) -> Result<Json<ApiResponse<BookEntry>>, ApiError> {
    let row = store.add(entry).await?;
    Ok(Json(ApiResponse::success(row)))
}

async fn remove_from(
    store: &ShelfStore<BookEntry>,
    id: String,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    store.remove(&VolumeId::new(id.as_str())).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Libro {id} eliminado de {}",
        store.name()
    )))))
}

/// POST /books/to-read
pub async fn add_to_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(entry): Json<NewBookEntry>,
) -> Result<Json<ApiResponse<BookEntry>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    add_to(&shelves.books_to_read, entry).await
}

/// DELETE /books/to-read/{id}
pub async fn remove_from_to_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    remove_from(&shelves.books_to_read, id).await
}

/// POST /books/read
pub async fn add_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(entry): Json<NewBookEntry>,
) -> Result<Json<ApiResponse<BookEntry>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    add_to(&shelves.books_read, entry).await
}

/// DELETE /books/read/{id}
pub async fn remove_from_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    remove_from(&shelves.books_read, id).await
}

/// POST /books/reading
pub async fn start_reading(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(entry): Json<NewBookEntry>,
) -> Result<Json<ApiResponse<ReadingEntry>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    let row = shelves.books_reading.add(entry).await?;
    Ok(Json(ApiResponse::success(row)))
}

/// DELETE /books/reading/{id}
pub async fn remove_from_reading(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    shelves.books_reading.remove(&VolumeId::new(id.as_str())).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Libro {id} eliminado de {}",
        shelves.books_reading.name()
    )))))
}

/// PUT /books/reading/{id}/progress
pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<ProgressRequest>,
) -> Result<Json<ApiResponse<ReadingEntry>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    shelves.books_reading.ensure_loaded().await?;
    let row = shelves
        .books_reading
        .update_progress(&VolumeId::new(id), request.current_page)
        .await?;
    Ok(Json(ApiResponse::success(row)))
}

/// POST /books/{id}/actions
pub async fn run_action(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<ApiResponse<BookMembership>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    let membership = books::run_action(
        state.google_books(),
        &shelves,
        &VolumeId::new(id),
        request.action,
    )
    .await?;
    Ok(Json(ApiResponse::success(membership)))
}

/// GET /books/{id}/review
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ReviewForm>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    shelves.book_reviews.ensure_loaded().await?;
    let review = shelves.book_reviews.review(&VolumeId::new(id));
    Ok(Json(ApiResponse::success(ReviewForm::for_record(
        review.as_ref(),
    ))))
}

/// PUT /books/{id}/review
pub async fn save_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(input): Json<ReviewInput>,
) -> Result<Json<ApiResponse<BookReview>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    input.normalize().map_err(ApiError::validation)?;

    tokio::try_join!(
        shelves.book_reviews.ensure_loaded(),
        shelves.books_to_read.ensure_loaded(),
        shelves.books_reading.ensure_loaded(),
        shelves.books_read.ensure_loaded(),
    )?;
    let id = VolumeId::new(id);
    let subject = books::review_subject(state.google_books(), &shelves, &id).await?;
    let review = shelves.book_reviews.save(subject, &input).await?;
    Ok(Json(ApiResponse::success(review)))
}

/// DELETE /books/{id}/review
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let shelves = user.require_shelves(&state)?;
    shelves.book_reviews.remove(&VolumeId::new(id)).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Reseña eliminada",
    ))))
}
