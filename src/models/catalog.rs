use serde::Serialize;

use crate::domain::ExternalId;

/// Provider-neutral browse result rendered as a card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
    pub id: ExternalId,
    pub title: String,
    /// Release year for movies, joined authors for books.
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub rating_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub page: u32,
    pub total_pages: u32,
    pub total_items: u32,
}

impl CatalogPage {
    #[must_use]
    pub const fn empty(page: u32) -> Self {
        Self {
            items: Vec::new(),
            page,
            total_pages: 0,
            total_items: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Treats blank provider strings as missing.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
