mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use mediashelf::db::DEFAULT_API_KEY;
use mediashelf::services::AuthService as _;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{Upstream, spawn_upstream, test_config};

async fn spawn_app() -> (Router, Upstream) {
    let upstream = spawn_upstream().await;
    let state = mediashelf::api::create_app_state_from_config(test_config(&upstream), None)
        .await
        .expect("Failed to create app state");
    (mediashelf::api::router(state).await, upstream)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

fn get(uri: &str, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("X-Api-Key", key);
    }
    builder.body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, api_key: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("X-Api-Key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn delete(uri: &str, api_key: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("X-Api-Key", api_key)
        .body(Body::empty())
        .unwrap()
}

const ADMIN: Option<&str> = Some(DEFAULT_API_KEY);

#[tokio::test]
async fn test_login_sets_session_used_by_nav() {
    let (app, _upstream) = spawn_app().await;

    let (status, body) = send(&app, get("/api/nav", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["kind"], "sign_in");
    assert_eq!(body["data"]["menus"][0]["links"][1]["href"], "/movies/watchlist");
    assert_eq!(body["data"]["menus"][1]["links"][3]["label"], "Leídos");

    let (status, _) = send(
        &app,
        with_json(
            "POST",
            "/api/auth/login",
            None,
            &json!({"username": "admin", "password": "wrong"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(with_json(
            "POST",
            "/api/auth/login",
            None,
            &json!({"username": "admin", "password": "password"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("session cookie")
        .to_string();

    let request = Request::builder()
        .uri("/api/nav")
        .header("Cookie", &cookie)
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(&app, request).await;
    assert_eq!(body["data"]["user"]["kind"], "signed_in");
    assert_eq!(body["data"]["user"]["initial"], "A");
    assert_eq!(body["data"]["user"]["username"], "admin");

    let request = Request::builder()
        .uri("/api/auth/me")
        .header("Cookie", &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "admin");
}

#[tokio::test]
async fn test_browse_movies_anonymously() {
    let (app, _upstream) = spawn_app().await;

    let (status, body) = send(&app, get("/api/movies?category=top_rated&page=2", None)).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["tabs"][2]["active"], true);
    assert_eq!(data["results"]["state"], "ready");
    assert_eq!(data["results"]["data"]["page"], 2);
    let card = &data["results"]["data"]["cards"][0];
    assert_eq!(card["title"], "Matrix");
    assert_eq!(card["href"], "/movies/matrix?id=603");
    assert_eq!(card["footer"], "25000 votos");

    let (status, body) = send(&app, get("/api/movies?q=nada", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["results"]["state"], "empty");
    assert_eq!(body["data"]["search"], "nada");

    let (status, _) = send(&app, get("/api/movies?category=cartoons", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_movie_details_errors() {
    let (app, _upstream) = spawn_app().await;

    let (status, body) = send(&app, get("/api/movies/1", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, get("/api/movies/603", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["signed_in"], false);
    assert_eq!(body["data"]["year"], "1999");
    assert!(body["data"].get("actions").is_none());
}

#[tokio::test]
async fn test_missing_tmdb_key_is_configuration_error() {
    let upstream = spawn_upstream().await;
    let mut config = test_config(&upstream);
    config.tmdb.api_key = None;
    let state = mediashelf::api::create_app_state_from_config(config, None)
        .await
        .unwrap();
    let app = mediashelf::api::router(state).await;

    let (status, body) = send(&app, get("/api/movies", None)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("TMDB_API_KEY"));
    assert_eq!(upstream.calls.tmdb(), 0);
}

#[tokio::test]
async fn test_shelves_need_sign_in() {
    let (app, _upstream) = spawn_app().await;

    let (status, body) = send(&app, get("/api/movies/watchlist", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "signed_out");

    let (status, _) = send(
        &app,
        with_json(
            "POST",
            "/api/movies/watchlist",
            None,
            &json!({"tmdb_id": 603, "title": "Matrix"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/api/movies/watchlist", Some("wrong-key"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_watchlist_then_mark_watched() {
    let (app, _upstream) = spawn_app().await;

    let (status, body) = send(&app, get("/api/movies/watchlist", ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "empty");

    let (status, body) = send(
        &app,
        with_json(
            "POST",
            "/api/movies/603/actions",
            ADMIN,
            &json!({"action": "add_to_watchlist"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["on_watchlist"], true);

    let (status, body) = send(
        &app,
        with_json(
            "POST",
            "/api/movies/watchlist",
            ADMIN,
            &json!({"tmdb_id": 603, "title": "Matrix"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (_, body) = send(&app, get("/api/movies/watchlist", ADMIN)).await;
    assert_eq!(body["data"]["state"], "ready");
    let cards = body["data"]["data"]["cards"].as_array().unwrap();
    assert_eq!(cards.len(), 1);
    assert!(cards[0]["footer"].as_str().unwrap().starts_with("Agregada el"));

    let (_, body) = send(
        &app,
        with_json(
            "POST",
            "/api/movies/603/actions",
            ADMIN,
            &json!({"action": "mark_watched"}),
        ),
    )
    .await;
    assert_eq!(body["data"]["on_watchlist"], false);
    assert_eq!(body["data"]["watched"], true);

    let (_, body) = send(&app, get("/api/movies/watchlist", ADMIN)).await;
    assert_eq!(body["data"]["state"], "empty");
    let (_, body) = send(&app, get("/api/movies/watched", ADMIN)).await;
    assert!(
        body["data"]["data"]["cards"][0]["footer"]
            .as_str()
            .unwrap()
            .starts_with("Vista el")
    );

    let (status, _) = send(&app, delete("/api/movies/watched/603", DEFAULT_API_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, get("/api/movies/603", ADMIN)).await;
    assert_eq!(body["data"]["membership"]["watched"], false);
}

#[tokio::test]
async fn test_empty_review_rejected_before_any_call() {
    let (app, upstream) = spawn_app().await;

    let (status, body) = send(
        &app,
        with_json(
            "PUT",
            "/api/movies/603/review",
            ADMIN,
            &json!({"rating": 0, "comment": "   "}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Agrega una calificación o un comentario");
    assert_eq!(upstream.calls.tmdb(), 0);

    let (status, body) = send(
        &app,
        with_json(
            "PUT",
            "/api/movies/603/review",
            ADMIN,
            &json!({"rating": 9, "comment": ""}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Matrix");
    assert_eq!(body["data"]["rating"], 9);

    let (_, body) = send(&app, get("/api/movies/603/review", ADMIN)).await;
    assert_eq!(body["data"]["mode"], "viewing");
    assert_eq!(body["data"]["rating"], 9);

    let (_, body) = send(&app, get("/api/movies/reviews", ADMIN)).await;
    assert_eq!(body["data"]["state"], "ready");

    let (status, _) = send(&app, delete("/api/movies/603/review", DEFAULT_API_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, get("/api/movies/603/review", ADMIN)).await;
    assert_eq!(body["data"]["mode"], "editing");
}

#[tokio::test]
async fn test_reading_progress_flow() {
    let (app, _upstream) = spawn_app().await;

    let (status, body) = send(&app, get("/api/books?category=fiction", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["results"]["data"]["cards"][0]["href"],
        "/books/dune?id=dune1"
    );

    let (_, body) = send(
        &app,
        with_json(
            "POST",
            "/api/books/dune1/actions",
            ADMIN,
            &json!({"action": "add_to_read"}),
        ),
    )
    .await;
    assert_eq!(body["data"]["to_read"], true);

    let (_, body) = send(
        &app,
        with_json(
            "POST",
            "/api/books/dune1/actions",
            ADMIN,
            &json!({"action": "start_reading"}),
        ),
    )
    .await;
    assert_eq!(body["data"]["to_read"], false);
    assert_eq!(body["data"]["reading"], true);

    let (status, body) = send(
        &app,
        with_json(
            "PUT",
            "/api/books/reading/dune1/progress",
            ADMIN,
            &json!({"current_page": 206}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["current_page"], 206);
    assert_eq!(body["data"]["total_pages"], 412);

    let (_, body) = send(&app, get("/api/books/reading", ADMIN)).await;
    assert_eq!(
        body["data"]["data"]["cards"][0]["footer"],
        "50% - Página 206 de 412"
    );

    let (status, _) = send(
        &app,
        with_json(
            "PUT",
            "/api/books/reading/dune1/progress",
            ADMIN,
            &json!({"current_page": -1}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(
        &app,
        with_json(
            "POST",
            "/api/books/dune1/actions",
            ADMIN,
            &json!({"action": "mark_read"}),
        ),
    )
    .await;
    assert_eq!(body["data"]["reading"], false);
    assert_eq!(body["data"]["read"], true);

    let (_, body) = send(&app, get("/api/books/read", ADMIN)).await;
    assert!(
        body["data"]["data"]["cards"][0]["footer"]
            .as_str()
            .unwrap()
            .starts_with("Terminado el")
    );
}

#[tokio::test]
async fn test_users_do_not_see_each_other() {
    let upstream = spawn_upstream().await;
    let state = mediashelf::api::create_app_state_from_config(test_config(&upstream), None)
        .await
        .unwrap();
    let user = state.auth().register("beatriz", "contraseña-larga").await.unwrap();
    let other_key = state.auth().get_api_key(&user.username).await.unwrap();
    let app = mediashelf::api::router(state).await;

    send(
        &app,
        with_json(
            "POST",
            "/api/movies/603/actions",
            ADMIN,
            &json!({"action": "add_to_watchlist"}),
        ),
    )
    .await;
    let (_, body) = send(&app, get("/api/movies/watchlist", Some(&other_key))).await;
    assert_eq!(body["data"]["state"], "empty");

    let (_, body) = send(&app, get("/api/movies/watchlist", ADMIN)).await;
    assert_eq!(body["data"]["state"], "ready");
}

#[tokio::test]
async fn test_health_and_status() {
    let (app, _upstream) = spawn_app().await;

    let (status, body) = send(&app, get("/api/system/health/ready", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["checks"]["database"], true);

    let (status, body) = send(&app, get("/api/system/status", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}
