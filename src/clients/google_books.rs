use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{CatalogSource, MetadataError, send_checked};
use crate::config::GoogleBooksConfig;
use crate::domain::{ExternalId, VolumeId};
use crate::models::catalog::non_blank;
use crate::models::{BookQuery, CatalogItem, CatalogPage, VolumeDetails};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumesResponse {
    #[serde(default)]
    total_items: u32,
    #[serde(default)]
    items: Vec<VolumeResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeResource {
    id: String,
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VolumeInfo {
    title: Option<String>,
    subtitle: Option<String>,
    authors: Vec<String>,
    publisher: Option<String>,
    published_date: Option<String>,
    description: Option<String>,
    page_count: Option<i32>,
    categories: Vec<String>,
    average_rating: Option<f64>,
    ratings_count: Option<u32>,
    language: Option<String>,
    image_links: Option<ImageLinks>,
    preview_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ImageLinks {
    small_thumbnail: Option<String>,
    thumbnail: Option<String>,
    small: Option<String>,
    medium: Option<String>,
    large: Option<String>,
}

impl ImageLinks {
    /// Largest available cover, `large` first.
    fn best(&self) -> Option<&str> {
        [&self.large, &self.medium, &self.small, &self.thumbnail]
            .into_iter()
            .find_map(|link| link.as_deref().filter(|l| !l.is_empty()))
    }

    fn card(&self) -> Option<&str> {
        [&self.thumbnail, &self.small_thumbnail]
            .into_iter()
            .find_map(|link| link.as_deref().filter(|l| !l.is_empty()))
    }
}

#[derive(Clone)]
pub struct GoogleBooksClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    require_api_key: bool,
    default_page_size: u32,
}

impl GoogleBooksClient {
    #[must_use]
    pub fn new(client: Client, config: &GoogleBooksConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            require_api_key: config.require_api_key,
            default_page_size: config.default_page_size,
        }
    }

    #[must_use]
    pub const fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    /// `&key=...` suffix, or an error when a key is required but absent.
    fn key_param(&self) -> Result<String, MetadataError> {
        match &self.api_key {
            Some(key) => Ok(format!("&key={}", urlencoding::encode(key))),
            None if self.require_api_key => Err(MetadataError::Configuration(
                "Google Books API key is not configured (set GOOGLE_BOOKS_API_KEY)".to_string(),
            )),
            None => Ok(String::new()),
        }
    }

    pub async fn fetch(&self, query: &BookQuery) -> Result<CatalogPage, MetadataError> {
        let key = self.key_param()?;
        let q = query.query_string();
        let max_results = query.max_results();

        let url = format!(
            "{}/volumes?q={}&startIndex={}&maxResults={}&orderBy=relevance{}",
            self.base_url,
            urlencoding::encode(&q),
            query.start_index(),
            max_results,
            key
        );

        debug!(q = %q, start_index = query.start_index(), max_results, "Fetching Google Books volumes");

        let response = send_checked("Google Books", self.client.get(&url)).await?;
        let body: VolumesResponse = response.json().await?;

        Ok(CatalogPage {
            items: body.items.into_iter().map(to_item).collect(),
            page: query.page.max(1),
            total_pages: body.total_items.div_ceil(max_results),
            total_items: body.total_items,
        })
    }

    pub async fn details(&self, id: &VolumeId) -> Result<VolumeDetails, MetadataError> {
        let key = self.key_param()?;
        let mut url = format!("{}/volumes/{}", self.base_url, urlencoding::encode(id.as_str()));
        if let Some(key) = key.strip_prefix('&') {
            url.push('?');
            url.push_str(key);
        }

        debug!(volume_id = %id, "Fetching Google Books volume");

        let response = send_checked("Google Books", self.client.get(&url)).await?;
        let volume: VolumeResource = response.json().await?;
        let info = volume.volume_info;

        Ok(VolumeDetails {
            id: VolumeId::new(volume.id),
            cover_url: info
                .image_links
                .as_ref()
                .and_then(ImageLinks::best)
                .map(secure_link),
            title: info.title.unwrap_or_default(),
            subtitle: non_blank(info.subtitle),
            authors: info.authors,
            publisher: non_blank(info.publisher),
            published_date: non_blank(info.published_date),
            description: info.description.as_deref().and_then(plain_text),
            page_count: info.page_count.filter(|p| *p > 0),
            categories: info.categories,
            average_rating: info.average_rating,
            ratings_count: info.ratings_count,
            language: non_blank(info.language),
            preview_link: non_blank(info.preview_link),
        })
    }
}

#[async_trait::async_trait]
impl CatalogSource for GoogleBooksClient {
    type Query = BookQuery;

    async fn fetch_page(&self, query: BookQuery) -> Result<CatalogPage, MetadataError> {
        self.fetch(&query).await
    }
}

fn to_item(volume: VolumeResource) -> CatalogItem {
    let info = volume.volume_info;
    CatalogItem {
        id: ExternalId::Book(VolumeId::new(volume.id)),
        title: info.title.unwrap_or_default(),
        subtitle: (!info.authors.is_empty()).then(|| info.authors.join(", ")),
        image_url: info
            .image_links
            .as_ref()
            .and_then(ImageLinks::card)
            .map(secure_link),
        description: info.description.as_deref().and_then(plain_text),
        rating: info.average_rating,
        rating_count: info.ratings_count,
    }
}

/// Google serves image links over plain http.
fn secure_link(link: &str) -> String {
    link.strip_prefix("http://")
        .map_or_else(|| link.to_string(), |rest| format!("https://{rest}"))
}

/// Strips the HTML Google Books puts in descriptions.
fn plain_text(html: &str) -> Option<String> {
    let text = html2text::from_read(html.as_bytes(), 10_000)
        .unwrap_or_else(|_| html.to_string());
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}
