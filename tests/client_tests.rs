mod common;

use std::sync::Arc;

use mediashelf::clients::{CatalogFeed, GoogleBooksClient, MetadataError, TmdbClient, build_http_client};
use mediashelf::domain::{TmdbId, VolumeId};
use mediashelf::models::{BookCategory, BookQuery, MovieCategory, MovieQuery};

use common::{spawn_upstream, test_config};

#[tokio::test]
async fn test_tmdb_list_and_details() {
    let upstream = spawn_upstream().await;
    let config = test_config(&upstream);
    let tmdb = TmdbClient::new(build_http_client(5).unwrap(), &config.tmdb);

    let page = tmdb.list(MovieCategory::Upcoming, 2).await.unwrap();
    assert_eq!(page.page, 2);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.total_items, 55);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].subtitle.as_deref(), Some("1999"));
    assert_eq!(page.items[1].description, None);

    let movie = tmdb.details(TmdbId::new(603)).await.unwrap();
    assert_eq!(movie.title, "Matrix");
    assert_eq!(movie.runtime_label().as_deref(), Some("2h 16m"));
    assert_eq!(movie.genres[0].name, "Acción");
    assert!(movie.poster_url.ends_with("/matrix.jpg"));
}

#[tokio::test]
async fn test_tmdb_search_and_errors() {
    let upstream = spawn_upstream().await;
    let mut config = test_config(&upstream);
    let tmdb = TmdbClient::new(build_http_client(5).unwrap(), &config.tmdb);

    let found = tmdb.search("matrix", 1).await.unwrap();
    assert_eq!(found.items.len(), 1);
    assert!(tmdb.search("zzz", 1).await.unwrap().is_empty());

    let missing = tmdb.details(TmdbId::new(1)).await.unwrap_err();
    assert!(matches!(missing, MetadataError::Http { status: 404, .. }));

    config.tmdb.api_key = Some("otra".into());
    let wrong_key = TmdbClient::new(build_http_client(5).unwrap(), &config.tmdb);
    let err = wrong_key.list(MovieCategory::Popular, 1).await.unwrap_err();
    assert!(matches!(err, MetadataError::Http { status: 401, .. }));

    config.tmdb.api_key = Some("  ".into());
    let calls_before = upstream.calls.tmdb();
    let no_key = TmdbClient::new(build_http_client(5).unwrap(), &config.tmdb);
    let err = no_key.fetch(&MovieQuery::default()).await.unwrap_err();
    assert!(matches!(err, MetadataError::Configuration(_)));
    assert_eq!(upstream.calls.tmdb(), calls_before);
}

#[tokio::test]
async fn test_google_books_volumes() {
    let upstream = spawn_upstream().await;
    let config = test_config(&upstream);
    let books = GoogleBooksClient::new(build_http_client(5).unwrap(), &config.google_books);

    let page = books
        .fetch(&BookQuery {
            category: BookCategory::Fiction,
            ..BookQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total_items, 1);
    assert_eq!(page.total_pages, 1);
    let item = &page.items[0];
    assert_eq!(item.subtitle.as_deref(), Some("Frank Herbert"));
    assert!(item.image_url.as_deref().unwrap().starts_with("https://"));

    let volume = books.details(&VolumeId::new("dune1")).await.unwrap();
    assert_eq!(volume.page_count, Some(412));
    assert_eq!(volume.description.as_deref().map(str::trim), Some("Arrakis."));

    let err = books.details(&VolumeId::new("nope")).await.unwrap_err();
    assert!(matches!(err, MetadataError::Http { status: 404, .. }));
}

#[tokio::test]
async fn test_required_books_key_short_circuits() {
    let upstream = spawn_upstream().await;
    let mut config = test_config(&upstream);
    config.google_books.require_api_key = true;
    let books = GoogleBooksClient::new(build_http_client(5).unwrap(), &config.google_books);

    let err = books.fetch(&BookQuery::default()).await.unwrap_err();

    assert!(matches!(err, MetadataError::Configuration(_)));
    assert_eq!(upstream.calls.books(), 0);
}

#[tokio::test]
async fn test_feed_keeps_latest_page() {
    let upstream = spawn_upstream().await;
    let config = test_config(&upstream);
    let tmdb = Arc::new(TmdbClient::new(build_http_client(5).unwrap(), &config.tmdb));
    let feed = CatalogFeed::new(tmdb);

    assert!(feed.current().is_none());
    feed.fetch(MovieQuery::search("matrix", 1)).await.unwrap();
    let page = feed
        .fetch(MovieQuery::category(MovieCategory::TopRated, 3))
        .await
        .unwrap();

    assert_eq!(feed.current(), Some(page));
}
