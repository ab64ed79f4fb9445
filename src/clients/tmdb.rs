use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{CatalogSource, MetadataError, send_checked};
use crate::config::TmdbConfig;
use crate::domain::{ExternalId, TmdbId};
use crate::models::catalog::non_blank;
use crate::models::movie::{Genre, image_url, release_year};
use crate::models::{CatalogItem, CatalogPage, ImageSize, MovieCategory, MovieDetails, MovieQuery};

#[derive(Debug, Deserialize)]
struct TmdbPage {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    results: Vec<TmdbMovie>,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    total_results: u32,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: i64,
    #[serde(default)]
    title: String,
    overview: Option<String>,
    poster_path: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    id: i64,
    #[serde(default)]
    title: String,
    original_title: Option<String>,
    tagline: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    runtime: Option<u32>,
    status: Option<String>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    vote_average: Option<f64>,
    vote_count: Option<u32>,
    budget: Option<u64>,
    revenue: Option<u64>,
    #[serde(default)]
    production_companies: Vec<TmdbCompany>,
    homepage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbCompany {
    name: String,
}

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    image_base_url: String,
    api_key: Option<String>,
    language: String,
}

impl TmdbClient {
    #[must_use]
    pub fn new(client: Client, config: &TmdbConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            language: config.language.clone(),
        }
    }

    fn api_key(&self) -> Result<&str, MetadataError> {
        self.api_key.as_deref().ok_or_else(|| {
            MetadataError::Configuration(
                "TMDB API key is not configured (set TMDB_API_KEY)".to_string(),
            )
        })
    }

    #[must_use]
    pub fn image_url(&self, path: Option<&str>, size: ImageSize) -> String {
        image_url(&self.image_base_url, path, size)
    }

    /// One page of a category list.
    pub async fn list(&self, category: MovieCategory, page: u32) -> Result<CatalogPage, MetadataError> {
        self.fetch(&MovieQuery::category(category, page)).await
    }

    pub async fn search(&self, term: &str, page: u32) -> Result<CatalogPage, MetadataError> {
        self.fetch(&MovieQuery::search(term, page)).await
    }

    /// Searches when the query carries a non-blank term, otherwise lists its category.
    pub async fn fetch(&self, query: &MovieQuery) -> Result<CatalogPage, MetadataError> {
        let api_key = self.api_key()?;
        let page = query.clamped_page();

        let url = match query.search_term() {
            Some(term) => format!(
                "{}/search/movie?api_key={}&language={}&page={}&query={}",
                self.base_url,
                urlencoding::encode(api_key),
                self.language,
                page,
                urlencoding::encode(term)
            ),
            None => format!(
                "{}/movie/{}?api_key={}&language={}&page={}",
                self.base_url,
                query.category.as_str(),
                urlencoding::encode(api_key),
                self.language,
                page
            ),
        };

        debug!(category = %query.category, search = ?query.search_term(), page, "Fetching TMDB movies");

        let response = send_checked("TMDB", self.client.get(&url)).await?;
        let body: TmdbPage = response.json().await?;

        Ok(CatalogPage {
            items: body.results.into_iter().map(|m| self.to_item(m)).collect(),
            page: body.page.max(page),
            total_pages: body.total_pages,
            total_items: body.total_results,
        })
    }

    pub async fn details(&self, id: TmdbId) -> Result<MovieDetails, MetadataError> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}/movie/{}?api_key={}&language={}",
            self.base_url,
            id,
            urlencoding::encode(api_key),
            self.language
        );

        debug!(tmdb_id = %id, "Fetching TMDB movie details");

        let response = send_checked("TMDB", self.client.get(&url)).await?;
        let movie: TmdbMovieDetails = response.json().await?;

        Ok(MovieDetails {
            id: TmdbId::new(movie.id),
            poster_url: self.image_url(movie.poster_path.as_deref(), ImageSize::W500),
            backdrop_url: movie
                .backdrop_path
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(|p| self.image_url(Some(p), ImageSize::Original)),
            title: movie.title,
            original_title: non_blank(movie.original_title),
            tagline: non_blank(movie.tagline),
            overview: non_blank(movie.overview),
            poster_path: non_blank(movie.poster_path),
            release_date: non_blank(movie.release_date),
            runtime: movie.runtime,
            status: non_blank(movie.status),
            genres: movie
                .genres
                .into_iter()
                .map(|g| Genre {
                    id: g.id,
                    name: g.name,
                })
                .collect(),
            vote_average: movie.vote_average,
            vote_count: movie.vote_count,
            budget: movie.budget.filter(|b| *b > 0),
            revenue: movie.revenue.filter(|r| *r > 0),
            production_companies: movie
                .production_companies
                .into_iter()
                .map(|c| c.name)
                .collect(),
            homepage: non_blank(movie.homepage),
        })
    }

    fn to_item(&self, movie: TmdbMovie) -> CatalogItem {
        CatalogItem {
            id: ExternalId::Movie(TmdbId::new(movie.id)),
            subtitle: release_year(movie.release_date.as_deref()).map(ToString::to_string),
            image_url: Some(self.image_url(movie.poster_path.as_deref(), ImageSize::W500)),
            title: movie.title,
            description: non_blank(movie.overview),
            rating: movie.vote_average,
            rating_count: movie.vote_count,
        }
    }
}

#[async_trait::async_trait]
impl CatalogSource for TmdbClient {
    type Query = MovieQuery;

    async fn fetch_page(&self, query: MovieQuery) -> Result<CatalogPage, MetadataError> {
        self.fetch(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_configuration_error() {
        let client = TmdbClient::new(Client::new(), &TmdbConfig::default());

        let err = client
            .list(MovieCategory::Popular, 1)
            .await
            .expect_err("no key configured");
        assert!(matches!(err, MetadataError::Configuration(_)));

        let err = client.details(TmdbId::new(1)).await.unwrap_err();
        assert!(matches!(err, MetadataError::Configuration(_)));
    }

    #[test]
    fn test_blank_key_treated_as_missing() {
        let config = TmdbConfig {
            api_key: Some("  ".to_string()),
            ..TmdbConfig::default()
        };
        let client = TmdbClient::new(Client::new(), &config);
        assert!(client.api_key().is_err());
    }

    #[test]
    fn test_item_mapping() {
        let client = TmdbClient::new(Client::new(), &TmdbConfig::default());
        let item = client.to_item(TmdbMovie {
            id: 603,
            title: "Matrix".to_string(),
            overview: Some(String::new()),
            poster_path: None,
            release_date: Some("1999-03-31".to_string()),
            vote_average: Some(8.2),
            vote_count: Some(25000),
        });

        assert_eq!(item.id, ExternalId::Movie(TmdbId::new(603)));
        assert_eq!(item.subtitle.as_deref(), Some("1999"));
        assert_eq!(item.description, None);
        assert_eq!(item.image_url.as_deref(), Some("/placeholder-movie.jpg"));
    }
}
