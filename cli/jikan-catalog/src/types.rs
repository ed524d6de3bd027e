//! Catalog domain types.
//!
//! These mirror the records returned by the upstream API. Fields are optional
//! wherever upstream omits or nulls them; no normalization is applied beyond
//! defaulting missing collections to empty.

use std::fmt::Display;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};

use crate::error::FetchError;

/// Rendered in place of a missing value, never `0`.
pub const UNAVAILABLE: &str = "N/A";

fn display_or_unavailable<T: Display>(value: Option<T>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

/// Reference to another catalog entity (genre, studio, producer, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedResource {
    pub mal_id: u64,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageUrls {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub jpg: Option<ImageUrls>,
    #[serde(default)]
    pub webp: Option<ImageUrls>,
}

impl Images {
    /// Largest jpg available.
    pub fn best_jpg(&self) -> Option<&str> {
        let jpg = self.jpg.as_ref()?;
        jpg.large_image_url
            .as_deref()
            .or(jpg.image_url.as_deref())
            .or(jpg.small_image_url.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trailer {
    #[serde(default)]
    pub youtube_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aired {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub string: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub name: String,
    pub url: String,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub relation: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub entry: Vec<NamedResource>,
}

/// A single anime as returned by the catalog.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub mal_id: u64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub title_japanese: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub airing: Option<bool>,
    #[serde(default)]
    pub aired: Option<Aired>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub scored_by: Option<u64>,
    #[serde(default)]
    pub rank: Option<u64>,
    #[serde(default)]
    pub popularity: Option<u64>,
    #[serde(default)]
    pub members: Option<u64>,
    #[serde(default)]
    pub favorites: Option<u64>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub broadcast: Option<Broadcast>,
    #[serde(default)]
    pub images: Option<Images>,
    #[serde(default)]
    pub trailer: Option<Trailer>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub genres: Vec<NamedResource>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub studios: Vec<NamedResource>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub producers: Vec<NamedResource>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub licensors: Vec<NamedResource>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub streaming: Vec<ExternalLink>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl CatalogItem {
    pub fn poster_url(&self) -> Option<&str> {
        self.images.as_ref().and_then(Images::best_jpg)
    }

    pub fn display_score(&self) -> String {
        display_or_unavailable(self.score)
    }

    pub fn display_episodes(&self) -> String {
        display_or_unavailable(self.episodes)
    }

    pub fn display_rank(&self) -> String {
        display_or_unavailable(self.rank.map(|rank| format!("#{rank}")))
    }

    pub fn display_members(&self) -> String {
        display_or_unavailable(self.members)
    }

    /// e.g. `spring 2024`, if both parts are known.
    pub fn display_season(&self) -> Option<String> {
        Some(format!("{} {}", self.season.as_ref()?, self.year?))
    }
}

/// A person credited on an anime (voice actor or staff member).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    pub mal_id: u64,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub images: Option<Images>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceActor {
    pub person: PersonRef,
    #[serde(default)]
    pub language: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterEntry {
    pub character: PersonRef,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub favorites: Option<u64>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub voice_actors: Vec<VoiceActor>,
}

impl CharacterEntry {
    /// The voice actor listed first, usually the Japanese cast.
    pub fn lead_voice_actor(&self) -> Option<&PersonRef> {
        self.voice_actors.first().map(|va| &va.person)
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffEntry {
    pub person: PersonRef,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub positions: Vec<String>,
}

/// One page of a paginated list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub total_count: u64,
    pub page_size: u32,
    pub page_number: u32,
}

impl CatalogPage {
    /// `ceil(total_count / page_size)`, zero for an empty result.
    pub fn total_pages(&self) -> u64 {
        total_pages(self.total_count, self.page_size)
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page_number) < self.total_pages()
    }
}

pub fn total_pages(total_count: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(u64::from(page_size))
}

/// Progress of one request, owned by whoever issued it.
#[derive(Debug, Clone)]
pub enum FetchState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(Arc<FetchError>),
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        FetchState::Idle
    }
}

impl<T> FetchState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            FetchState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchState::Failed(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// Loaded or failed.
    pub fn is_settled(&self) -> bool {
        matches!(self, FetchState::Loaded(_) | FetchState::Failed(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }
}

impl<T> From<Result<T, FetchError>> for FetchState<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => FetchState::Loaded(value),
            Err(err) => FetchState::Failed(Arc::new(err)),
        }
    }
}

/// Sections of the home page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeFeed {
    pub trending: Vec<CatalogItem>,
    pub popular: Vec<CatalogItem>,
    pub seasonal: Vec<CatalogItem>,
    pub upcoming: Vec<CatalogItem>,
    pub top_movies: Vec<CatalogItem>,
}
