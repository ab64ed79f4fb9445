//! Local stand-ins for TMDB and Google Books, plus app bootstrap helpers.
#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use mediashelf::config::Config;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const TEST_TMDB_KEY: &str = "test-tmdb-key";

#[derive(Default)]
pub struct Calls {
    pub tmdb: AtomicUsize,
    pub books: AtomicUsize,
}

impl Calls {
    pub fn tmdb(&self) -> usize {
        self.tmdb.load(Ordering::SeqCst)
    }

    pub fn books(&self) -> usize {
        self.books.load(Ordering::SeqCst)
    }
}

pub struct Upstream {
    pub base_url: String,
    pub calls: Arc<Calls>,
}

fn matrix() -> Value {
    json!({
        "id": 603,
        "title": "Matrix",
        "overview": "Un hacker descubre la verdad.",
        "poster_path": "/matrix.jpg",
        "release_date": "1999-03-30",
        "vote_average": 8.2,
        "vote_count": 25000
    })
}

fn arrival() -> Value {
    json!({
        "id": 329_865,
        "title": "La llegada",
        "overview": "",
        "poster_path": null,
        "release_date": "2016-11-10",
        "vote_average": 7.6,
        "vote_count": 18000
    })
}

fn dune() -> Value {
    json!({
        "id": "dune1",
        "volumeInfo": {
            "title": "Dune",
            "authors": ["Frank Herbert"],
            "description": "<p>Arrakis.</p>",
            "pageCount": 412,
            "averageRating": 4.5,
            "ratingsCount": 120,
            "imageLinks": { "thumbnail": "http://books.google.com/dune.jpg" }
        }
    })
}

async fn tmdb_movie(
    State(calls): State<Arc<Calls>>,
    Path(segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    calls.tmdb.fetch_add(1, Ordering::SeqCst);
    if params.get("api_key").map(String::as_str) != Some(TEST_TMDB_KEY) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"status_message": "Invalid API key"})));
    }

    match segment.parse::<i64>() {
        Ok(603) => {
            let mut details = matrix();
            details["runtime"] = json!(136);
            details["tagline"] = json!("Bienvenido al mundo real");
            details["genres"] = json!([{ "id": 28, "name": "Acción" }]);
            (StatusCode::OK, Json(details))
        }
        Ok(329_865) => (StatusCode::OK, Json(arrival())),
        Ok(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({"status_message": "The resource you requested could not be found."})),
        ),
        Err(_) => {
            let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
            (
                StatusCode::OK,
                Json(json!({
                    "page": page,
                    "results": [matrix(), arrival()],
                    "total_pages": 3,
                    "total_results": 55
                })),
            )
        }
    }
}

async fn tmdb_search(
    State(calls): State<Arc<Calls>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    calls.tmdb.fetch_add(1, Ordering::SeqCst);
    let results = match params.get("query").map(String::as_str) {
        Some("matrix") => vec![matrix()],
        _ => Vec::new(),
    };
    let total = results.len();
    Json(json!({
        "page": 1,
        "results": results,
        "total_pages": u32::from(total > 0),
        "total_results": total
    }))
}

async fn volumes(
    State(calls): State<Arc<Calls>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    calls.books.fetch_add(1, Ordering::SeqCst);
    let items = match params.get("q").map(String::as_str) {
        Some("subject:fiction" | "dune") => vec![dune()],
        _ => Vec::new(),
    };
    Json(json!({ "totalItems": items.len(), "items": items }))
}

async fn volume(State(calls): State<Arc<Calls>>, Path(id): Path<String>) -> impl IntoResponse {
    calls.books.fetch_add(1, Ordering::SeqCst);
    if id == "dune1" {
        (StatusCode::OK, Json(dune()))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {"code": 404, "message": "The volume ID could not be found."}})),
        )
    }
}

/// Serves both providers on an ephemeral local port.
pub async fn spawn_upstream() -> Upstream {
    let calls = Arc::new(Calls::default());
    let app = Router::new()
        .route("/3/movie/{segment}", get(tmdb_movie))
        .route("/3/search/movie", get(tmdb_search))
        .route("/books/v1/volumes", get(volumes))
        .route("/books/v1/volumes/{id}", get(volume))
        .with_state(calls.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Upstream {
        base_url: format!("http://{addr}"),
        calls,
    }
}

/// Config pointing at `upstream`, with a throwaway database and cheap hashing.
pub fn test_config(upstream: &Upstream) -> Config {
    let db_path =
        std::env::temp_dir().join(format!("mediashelf-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.tmdb.base_url = format!("{}/3", upstream.base_url);
    config.tmdb.api_key = Some(TEST_TMDB_KEY.to_string());
    config.google_books.base_url = format!("{}/books/v1", upstream.base_url);
    config.server.secure_cookies = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}
