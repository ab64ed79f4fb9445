use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::latest::FeedRegistry;
use crate::clients::{GoogleBooksClient, TmdbClient, build_http_client};
use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, SeaOrmAuthService};
use crate::shelf::ShelfRegistry;

/// Open catalog feeds kept per provider.
const MAX_FEEDS: usize = 256;

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth: Arc<dyn AuthService>,

    pub tmdb: Arc<TmdbClient>,

    pub google_books: Arc<GoogleBooksClient>,

    pub movie_feeds: Arc<FeedRegistry<TmdbClient>>,

    pub book_feeds: Arc<FeedRegistry<GoogleBooksClient>>,

    pub shelves: Arc<ShelfRegistry>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        // One pooled client for both metadata providers.
        let http_client = build_http_client(config.general.request_timeout_seconds)?;

        let tmdb = Arc::new(TmdbClient::new(http_client.clone(), &config.tmdb));
        let google_books = Arc::new(GoogleBooksClient::new(http_client, &config.google_books));

        let auth: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        ));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            movie_feeds: Arc::new(FeedRegistry::new(tmdb.clone(), MAX_FEEDS)),
            book_feeds: Arc::new(FeedRegistry::new(google_books.clone(), MAX_FEEDS)),
            shelves: Arc::new(ShelfRegistry::new(store.clone())),
            store,
            auth,
            tmdb,
            google_books,
        })
    }
}
