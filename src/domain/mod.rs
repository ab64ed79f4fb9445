//! Strongly typed identifiers shared across the shelf, client and API layers.
//!
//! Catalog ids come from the external metadata providers (numeric for TMDB,
//! opaque strings for Google Books) and are distinct from the row ids the
//! backend assigns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a signed-in user (the `users.id` column).
///
/// # Examples
///
/// ```rust
/// use mediashelf::domain::UserId;
///
/// let id = UserId::new(7);
/// assert_eq!(id.value(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i32);

impl UserId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl From<UserId> for i32 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// TMDB movie id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TmdbId(i64);

impl TmdbId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TmdbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TmdbId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::str::FromStr for TmdbId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Google Books volume id, e.g. `zyTCAlFPjgYC`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeId(String);

impl VolumeId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VolumeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for VolumeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Catalog id of either provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalId {
    Movie(TmdbId),
    Book(VolumeId),
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie(id) => id.fmt(f),
            Self::Book(id) => id.fmt(f),
        }
    }
}

impl From<TmdbId> for ExternalId {
    fn from(id: TmdbId) -> Self {
        Self::Movie(id)
    }
}

impl From<VolumeId> for ExternalId {
    fn from(id: VolumeId) -> Self {
        Self::Book(id)
    }
}
