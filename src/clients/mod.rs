pub mod google_books;
pub mod latest;
pub mod tmdb;

pub use google_books::GoogleBooksClient;
pub use latest::{CatalogFeed, LatestRequest};
pub use tmdb::TmdbClient;

use std::time::{Duration, Instant};
use thiserror::Error;

use crate::models::CatalogPage;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetadataError {
    /// A required credential is missing; no request was sent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    /// A newer request on the same feed replaced this one.
    #[error("Request superseded by a newer one")]
    Superseded,
}

impl From<reqwest::Error> for MetadataError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Build the HTTP client shared by every metadata provider.
pub fn build_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("mediashelf/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// A paginated catalog that a [`CatalogFeed`] can drive.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    type Query: Send + 'static;

    async fn fetch_page(&self, query: Self::Query) -> Result<CatalogPage, MetadataError>;
}

/// Sends `request`, recording the outcome per provider, and turns a non-2xx
/// response into [`MetadataError::Http`].
async fn send_checked(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, MetadataError> {
    let started = Instant::now();
    let result = request.send().await;

    let status = match &result {
        Ok(response) => response.status().as_u16().to_string(),
        Err(_) => "transport_error".to_string(),
    };
    let labels = [("service", service.to_string()), ("status", status)];
    metrics::counter!("mediashelf_upstream_requests_total", &labels).increment(1);
    metrics::histogram!("mediashelf_upstream_request_duration_seconds", &labels)
        .record(started.elapsed().as_secs_f64());

    let response = result?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(MetadataError::Http {
        status: status.as_u16(),
        message: format!("{service} API error: {status} - {body}"),
    })
}
