//! URL fragments for item pages.

use unicode_normalization::UnicodeNormalization;

use crate::domain::{TmdbId, VolumeId};

/// Combining Diacritical Marks block, left behind by canonical decomposition.
fn is_combining_mark(c: char) -> bool {
    ('\u{300}'..='\u{36f}').contains(&c)
}

/// Lowercase ASCII words joined by single hyphens.
#[must_use]
pub fn slug(title: &str) -> String {
    let cleaned: String = title
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ' || *c == '-')
        .collect();

    cleaned
        .split([' ', '-'])
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[must_use]
pub fn movie_path(id: TmdbId, title: &str) -> String {
    format!("/movies/{}?id={id}", slug(title))
}

#[must_use]
pub fn book_path(id: &VolumeId, title: &str) -> String {
    format!("/books/{}?id={}", slug(title), urlencoding::encode(id.as_str()))
}
