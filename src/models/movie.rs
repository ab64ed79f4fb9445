use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::TmdbId;

/// Served when TMDB has no poster for a movie.
pub const PLACEHOLDER_POSTER: &str = "/placeholder-movie.jpg";

/// Highest page TMDB will serve for list and search endpoints.
pub const TMDB_MAX_PAGE: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieCategory {
    #[default]
    Popular,
    NowPlaying,
    TopRated,
    Upcoming,
}

impl MovieCategory {
    pub const ALL: [Self; 4] = [
        Self::Popular,
        Self::NowPlaying,
        Self::TopRated,
        Self::Upcoming,
    ];

    /// Path segment under `/movie/`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Popular => "popular",
            Self::NowPlaying => "now_playing",
            Self::TopRated => "top_rated",
            Self::Upcoming => "upcoming",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Popular => "Populares",
            Self::NowPlaying => "En Cartelera",
            Self::TopRated => "Mejor Valoradas",
            Self::Upcoming => "Próximamente",
        }
    }
}

impl fmt::Display for MovieCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovieCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown movie category: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MovieQuery {
    pub category: MovieCategory,
    pub search: Option<String>,
    pub page: u32,
}

impl MovieQuery {
    #[must_use]
    pub fn category(category: MovieCategory, page: u32) -> Self {
        Self {
            category,
            search: None,
            page,
        }
    }

    #[must_use]
    pub fn search(term: impl Into<String>, page: u32) -> Self {
        Self {
            category: MovieCategory::default(),
            search: Some(term.into()),
            page,
        }
    }

    /// Search term when it has content after trimming.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// 1-based page, clamped to what TMDB accepts.
    #[must_use]
    pub fn clamped_page(&self) -> u32 {
        self.page.clamp(1, TMDB_MAX_PAGE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    #[default]
    W500,
    W780,
    Original,
}

impl ImageSize {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::W500 => "w500",
            Self::W780 => "w780",
            Self::Original => "original",
        }
    }
}

/// Builds `{base}/{size}{path}`; a missing path yields the placeholder poster.
#[must_use]
pub fn image_url(base: &str, path: Option<&str>, size: ImageSize) -> String {
    match path.filter(|p| !p.is_empty()) {
        Some(path) => format!("{}/{}{}", base.trim_end_matches('/'), size.as_str(), path),
        None => PLACEHOLDER_POSTER.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieDetails {
    pub id: TmdbId,
    pub title: String,
    pub original_title: Option<String>,
    pub tagline: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub poster_url: String,
    pub backdrop_url: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<u32>,
    pub status: Option<String>,
    pub genres: Vec<Genre>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u32>,
    pub budget: Option<u64>,
    pub revenue: Option<u64>,
    pub production_companies: Vec<String>,
    pub homepage: Option<String>,
}

impl MovieDetails {
    #[must_use]
    pub fn year(&self) -> Option<&str> {
        release_year(self.release_date.as_deref())
    }

    /// `2h 16m` style runtime.
    #[must_use]
    pub fn runtime_label(&self) -> Option<String> {
        let minutes = self.runtime.filter(|m| *m > 0)?;
        Some(match (minutes / 60, minutes % 60) {
            (0, m) => format!("{m}m"),
            (h, 0) => format!("{h}h"),
            (h, m) => format!("{h}h {m}m"),
        })
    }
}

/// First four characters of a `YYYY-MM-DD` date.
#[must_use]
pub fn release_year(date: Option<&str>) -> Option<&str> {
    date.and_then(|d| d.get(..4)).filter(|y| !y.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://image.tmdb.org/t/p";

    #[test]
    fn test_image_url_sizes() {
        assert_eq!(
            image_url(BASE, Some("/abc.jpg"), ImageSize::W500),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
        assert_eq!(
            image_url(BASE, Some("/abc.jpg"), ImageSize::Original),
            "https://image.tmdb.org/t/p/original/abc.jpg"
        );
    }

    #[test]
    fn test_image_url_placeholder() {
        assert_eq!(image_url(BASE, None, ImageSize::W780), PLACEHOLDER_POSTER);
        assert_eq!(image_url(BASE, Some(""), ImageSize::W780), PLACEHOLDER_POSTER);
    }

    #[test]
    fn test_query_page_clamped() {
        assert_eq!(MovieQuery::category(MovieCategory::Popular, 0).clamped_page(), 1);
        assert_eq!(MovieQuery::category(MovieCategory::Popular, 9000).clamped_page(), 500);
        assert_eq!(MovieQuery::search("x", 3).clamped_page(), 3);
    }

    #[test]
    fn test_blank_search_term_ignored() {
        assert_eq!(MovieQuery::search("   ", 1).search_term(), None);
        assert_eq!(MovieQuery::search(" dune ", 1).search_term(), Some("dune"));
    }

    #[test]
    fn test_category_round_trip_from_str() {
        for category in MovieCategory::ALL {
            assert_eq!(category.as_str().parse::<MovieCategory>().unwrap(), category);
        }
        assert!("trending".parse::<MovieCategory>().is_err());
    }

    #[test]
    fn test_release_year() {
        assert_eq!(release_year(Some("1999-03-31")), Some("1999"));
        assert_eq!(release_year(Some("")), None);
        assert_eq!(release_year(None), None);
    }
}
