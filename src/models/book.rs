use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::VolumeId;

/// Google Books refuses `maxResults` above this.
pub const GOOGLE_BOOKS_MAX_RESULTS: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookCategory {
    #[default]
    Fiction,
    Science,
    History,
    Biography,
    Technology,
    Art,
}

impl BookCategory {
    pub const ALL: [Self; 6] = [
        Self::Fiction,
        Self::Science,
        Self::History,
        Self::Biography,
        Self::Technology,
        Self::Art,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fiction => "fiction",
            Self::Science => "science",
            Self::History => "history",
            Self::Biography => "biography",
            Self::Technology => "technology",
            Self::Art => "art",
        }
    }

    /// Fixed `q=` value sent for this category.
    #[must_use]
    pub const fn query(self) -> &'static str {
        match self {
            Self::Fiction => "subject:fiction",
            Self::Science => "subject:science",
            Self::History => "subject:history",
            Self::Biography => "subject:biography",
            Self::Technology => "subject:technology",
            Self::Art => "subject:art",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fiction => "Ficción",
            Self::Science => "Ciencia",
            Self::History => "Historia",
            Self::Biography => "Biografía",
            Self::Technology => "Tecnología",
            Self::Art => "Arte",
        }
    }
}

impl fmt::Display for BookCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown book category: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookQuery {
    pub category: BookCategory,
    pub search: Option<String>,
    /// 1-based
    pub page: u32,
    pub per_page: u32,
}

impl Default for BookQuery {
    fn default() -> Self {
        Self {
            category: BookCategory::default(),
            search: None,
            page: 1,
            per_page: 20,
        }
    }
}

impl BookQuery {
    /// `q=` parameter: a non-blank search term wins over the category.
    #[must_use]
    pub fn query_string(&self) -> String {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map_or_else(|| self.category.query().to_string(), ToString::to_string)
    }

    #[must_use]
    pub const fn max_results(&self) -> u32 {
        if self.per_page < 1 {
            1
        } else if self.per_page > GOOGLE_BOOKS_MAX_RESULTS {
            GOOGLE_BOOKS_MAX_RESULTS
        } else {
            self.per_page
        }
    }

    /// 0-based offset of the first result of `page`.
    #[must_use]
    pub const fn start_index(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VolumeDetails {
    pub id: VolumeId,
    pub title: String,
    pub subtitle: Option<String>,
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    /// Plain text, converted from the HTML Google returns.
    pub description: Option<String>,
    pub page_count: Option<i32>,
    pub categories: Vec<String>,
    pub average_rating: Option<f64>,
    pub ratings_count: Option<u32>,
    pub language: Option<String>,
    pub cover_url: Option<String>,
    pub preview_link: Option<String>,
}

impl VolumeDetails {
    /// `Por A, B` byline.
    #[must_use]
    pub fn byline(&self) -> Option<String> {
        if self.authors.is_empty() {
            None
        } else {
            Some(format!("Por {}", self.authors.join(", ")))
        }
    }
}

/// Comma-joined authors or the unknown-author label.
#[must_use]
pub fn authors_label(authors: &[String]) -> String {
    if authors.is_empty() {
        "Autor desconocido".to_string()
    } else {
        authors.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_queries() {
        assert_eq!(BookCategory::Fiction.query(), "subject:fiction");
        assert_eq!(BookCategory::Technology.query(), "subject:technology");
        assert_eq!("art".parse::<BookCategory>().unwrap(), BookCategory::Art);
    }

    #[test]
    fn test_search_wins_over_category() {
        let query = BookQuery {
            category: BookCategory::History,
            search: Some(" dune ".to_string()),
            ..BookQuery::default()
        };
        assert_eq!(query.query_string(), "dune");

        let blank = BookQuery {
            category: BookCategory::History,
            search: Some("  ".to_string()),
            ..BookQuery::default()
        };
        assert_eq!(blank.query_string(), "subject:history");
    }

    #[test]
    fn test_pagination_offsets() {
        let query = |page, per_page| BookQuery {
            page,
            per_page,
            ..BookQuery::default()
        };

        assert_eq!(query(1, 20).start_index(), 0);
        assert_eq!(query(3, 20).start_index(), 40);
        assert_eq!(query(0, 20).start_index(), 0);
        assert_eq!(query(2, 100).max_results(), 40);
        assert_eq!(query(2, 100).start_index(), 100);
        assert_eq!(query(1, 0).max_results(), 1);
    }

    #[test]
    fn test_authors_label() {
        assert_eq!(authors_label(&[]), "Autor desconocido");
        assert_eq!(
            authors_label(&["Frank Herbert".to_string(), "Brian Herbert".to_string()]),
            "Frank Herbert, Brian Herbert"
        );
    }
}
