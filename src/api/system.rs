//! Health probes, status and navigation.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiResponse, AppState};
use crate::ui::{NavBar, UserMenu, nav::NavMenu};

#[derive(Debug, Serialize)]
pub struct HealthLiveResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReadinessChecks {
    pub database: bool,
    pub tmdb_configured: bool,
    pub google_books_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub checks: HealthReadinessChecks,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub active_users: usize,
    pub movie_feeds: usize,
    pub book_feeds: usize,
}

#[derive(Debug, Serialize)]
pub struct NavResponse {
    pub menus: [NavMenu; 2],
    pub user: UserMenu,
}

/// `GET /api/system/health/live`
pub async fn health_live() -> impl IntoResponse {
    Json(ApiResponse::success(HealthLiveResponse { status: "alive" }))
}

/// `GET /api/system/health/ready`
///
/// Database connectivity plus provider credentials. A missing Google Books key
/// only fails readiness when the key is required.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> Response {
    let db_ready = state.store().ping().await.is_ok();

    let (tmdb_configured, google_books_configured) = {
        let config = state.config().read().await;
        let has_key = |key: &Option<String>| key.as_deref().is_some_and(|k| !k.trim().is_empty());
        (
            has_key(&config.tmdb.api_key),
            !config.google_books.require_api_key || has_key(&config.google_books.api_key),
        )
    };

    let ready = db_ready && tmdb_configured && google_books_configured;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::success(HealthReadyResponse {
            ready,
            checks: HealthReadinessChecks {
                database: db_ready,
                tmdb_configured,
                google_books_configured,
            },
        })),
    )
        .into_response()
}

/// `GET /api/system/status`
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<SystemStatus>> {
    Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        active_users: state.shelves().active_users(),
        movie_feeds: state.movie_feeds().len(),
        book_feeds: state.book_feeds().len(),
    }))
}

/// `GET /api/nav`
///
/// Section menus start closed; the user menu reflects the caller's identity.
pub async fn get_nav(Extension(user): Extension<CurrentUser>) -> Json<ApiResponse<NavResponse>> {
    Json(ApiResponse::success(NavResponse {
        menus: NavBar::new().menus(),
        user: NavBar::user_menu(user.0.as_ref()),
    }))
}
