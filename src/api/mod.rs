use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use metrics_exporter_prometheus::PrometheusHandle;

use crate::clients::latest::FeedRegistry;
use crate::clients::{GoogleBooksClient, TmdbClient};
use crate::config::Config;
use crate::services::AuthService;
use crate::shelf::ShelfRegistry;
use crate::state::SharedState;

pub mod auth;
mod books;
mod error;
mod movies;
mod observability;
mod system;
mod types;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth
    }

    #[must_use]
    pub fn tmdb(&self) -> &TmdbClient {
        &self.shared.tmdb
    }

    #[must_use]
    pub fn google_books(&self) -> &GoogleBooksClient {
        &self.shared.google_books
    }

    #[must_use]
    pub fn movie_feeds(&self) -> &FeedRegistry<TmdbClient> {
        &self.shared.movie_feeds
    }

    #[must_use]
    pub fn book_feeds(&self) -> &FeedRegistry<GoogleBooksClient> {
        &self.shared.book_feeds
    }

    #[must_use]
    pub fn shelves(&self) -> &ShelfRegistry {
        &self.shared.shelves
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, session_minutes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_minutes,
        )
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_minutes,
        )));

    let api_router = create_api_router(state.clone())
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/password", put(auth::change_password))
        .route("/auth/api-key", get(auth::get_api_key))
        .route("/auth/api-key/regenerate", post(auth::regenerate_api_key))
        .route("/nav", get(system::get_nav))
        .route("/movies", get(movies::browse))
        .route(
            "/movies/watchlist",
            get(movies::watchlist).post(movies::add_to_watchlist),
        )
        .route(
            "/movies/watchlist/{id}",
            delete(movies::remove_from_watchlist),
        )
        .route(
            "/movies/watched",
            get(movies::watched).post(movies::add_to_watched),
        )
        .route(
            "/movies/watched/{id}",
            delete(movies::remove_from_watched),
        )
        .route("/movies/reviews", get(movies::reviews))
        .route("/movies/{id}", get(movies::details))
        .route("/movies/{id}/actions", post(movies::run_action))
        .route(
            "/movies/{id}/review",
            get(movies::get_review)
                .put(movies::save_review)
                .delete(movies::delete_review),
        )
        .route("/books", get(books::browse))
        .route(
            "/books/to-read",
            get(books::to_read).post(books::add_to_read),
        )
        .route(
            "/books/to-read/{id}",
            delete(books::remove_from_to_read),
        )
        .route(
            "/books/reading",
            get(books::reading).post(books::start_reading),
        )
        .route(
            "/books/reading/{id}",
            delete(books::remove_from_reading),
        )
        .route(
            "/books/reading/{id}/progress",
            put(books::update_progress),
        )
        .route("/books/read", get(books::read).post(books::add_read))
        .route(
            "/books/read/{id}",
            delete(books::remove_from_read),
        )
        .route("/books/reviews", get(books::reviews))
        .route("/books/{id}", get(books::details))
        .route("/books/{id}/actions", post(books::run_action))
        .route(
            "/books/{id}/review",
            get(books::get_review)
                .put(books::save_review)
                .delete(books::delete_review),
        )
        .route("/system/health/live", get(system::health_live))
        .route("/system/health/ready", get(system::health_ready))
        .route("/system/status", get(system::get_status))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::identity_middleware,
        ))
}
