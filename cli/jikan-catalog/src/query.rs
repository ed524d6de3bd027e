//! Translate user intents (search, sort, page, category) into
//! [RequestDescriptor]s.
//!
//! Every function here is pure: identical inputs yield identical descriptors.

use std::num::NonZeroU32;
use std::str::FromStr;

use derive_more::Display;
use thiserror::Error;

use crate::descriptor::RequestDescriptor;

/// Ordering of a list page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
pub enum SortMode {
    #[default]
    #[display("alpha")]
    Alphabetical,
    #[display("popular")]
    Popularity,
    #[display("newest")]
    Newest,
}

impl SortMode {
    pub const ALL: [SortMode; 3] = [
        SortMode::Alphabetical,
        SortMode::Popularity,
        SortMode::Newest,
    ];

    /// Value of the `order_by` parameter.
    pub fn order_by(self) -> &'static str {
        match self {
            SortMode::Alphabetical => "title",
            // `popularity` is a rank, 1 being the most popular
            SortMode::Popularity => "popularity",
            SortMode::Newest => "start_date",
        }
    }

    /// Value of the `sort` parameter.
    pub fn sort_direction(self) -> &'static str {
        match self {
            SortMode::Alphabetical | SortMode::Popularity => "asc",
            SortMode::Newest => "desc",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl FromStr for SortMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alpha" | "alphabetical" | "title" => Ok(SortMode::Alphabetical),
            "popular" | "popularity" => Ok(SortMode::Popularity),
            "newest" | "new" => Ok(SortMode::Newest),
            _ => Err(UnknownVariant {
                kind: "sort mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Media type filter accepted by the `/top/anime` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum AnimeType {
    #[display("tv")]
    Tv,
    #[display("movie")]
    Movie,
    #[display("ova")]
    Ova,
    #[display("special")]
    Special,
    #[display("ona")]
    Ona,
    #[display("music")]
    Music,
}

/// Browsable categories, identified upstream by their MyAnimeList genre id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Genre {
    Action,
    Adventure,
    Comedy,
    Drama,
    Fantasy,
    Horror,
    Romance,
    SciFi,
    Mystery,
    Psychological,
    SliceOfLife,
    Sports,
    Supernatural,
    Suspense,
    Shounen,
    Shoujo,
    Seinen,
    Josei,
    Mecha,
    Music,
    School,
    Isekai,
    Military,
    Ecchi,
    Harem,
    Historical,
    MartialArts,
    Magic,
    Parody,
    Police,
    Space,
    Vampire,
    Demons,
    Game,
    SuperPower,
}

impl Genre {
    /// In navigation order: main genres, demographics, themes, sub-genres.
    pub const ALL: [Genre; 35] = [
        Genre::Action,
        Genre::Adventure,
        Genre::Comedy,
        Genre::Drama,
        Genre::Fantasy,
        Genre::Horror,
        Genre::Romance,
        Genre::SciFi,
        Genre::Mystery,
        Genre::Psychological,
        Genre::SliceOfLife,
        Genre::Sports,
        Genre::Supernatural,
        Genre::Suspense,
        Genre::Shounen,
        Genre::Shoujo,
        Genre::Seinen,
        Genre::Josei,
        Genre::Mecha,
        Genre::Music,
        Genre::School,
        Genre::Isekai,
        Genre::Military,
        Genre::Ecchi,
        Genre::Harem,
        Genre::Historical,
        Genre::MartialArts,
        Genre::Magic,
        Genre::Parody,
        Genre::Police,
        Genre::Space,
        Genre::Vampire,
        Genre::Demons,
        Genre::Game,
        Genre::SuperPower,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Comedy => "Comedy",
            Genre::Drama => "Drama",
            Genre::Fantasy => "Fantasy",
            Genre::Horror => "Horror",
            Genre::Romance => "Romance",
            Genre::SciFi => "Sci-Fi",
            Genre::Mystery => "Mystery",
            Genre::Psychological => "Psychological",
            Genre::SliceOfLife => "Slice of Life",
            Genre::Sports => "Sports",
            Genre::Supernatural => "Supernatural",
            Genre::Suspense => "Thriller",
            Genre::Shounen => "Shounen",
            Genre::Shoujo => "Shoujo",
            Genre::Seinen => "Seinen",
            Genre::Josei => "Josei",
            Genre::Mecha => "Mecha",
            Genre::Music => "Music",
            Genre::School => "School",
            Genre::Isekai => "Isekai",
            Genre::Military => "Military",
            Genre::Ecchi => "Ecchi",
            Genre::Harem => "Harem",
            Genre::Historical => "Historical",
            Genre::MartialArts => "Martial Arts",
            Genre::Magic => "Magic",
            Genre::Parody => "Parody",
            Genre::Police => "Police",
            Genre::Space => "Space",
            Genre::Vampire => "Vampire",
            Genre::Demons => "Demons",
            Genre::Game => "Game",
            Genre::SuperPower => "Super Power",
        }
    }

    pub fn mal_id(self) -> u32 {
        match self {
            Genre::Action => 1,
            Genre::Adventure => 2,
            Genre::Comedy => 4,
            Genre::Demons => 6,
            Genre::Mystery => 7,
            Genre::Drama => 8,
            Genre::Ecchi => 9,
            Genre::Fantasy => 10,
            Genre::Game => 11,
            Genre::Historical => 13,
            Genre::Horror => 14,
            Genre::Magic => 16,
            Genre::MartialArts => 17,
            Genre::Mecha => 18,
            Genre::Music => 19,
            Genre::Parody => 20,
            Genre::Romance => 22,
            Genre::School => 23,
            Genre::SciFi => 24,
            Genre::Shoujo => 25,
            Genre::Shounen => 27,
            Genre::Space => 29,
            Genre::Sports => 30,
            Genre::SuperPower => 31,
            Genre::Vampire => 32,
            Genre::Harem => 35,
            Genre::SliceOfLife => 36,
            Genre::Supernatural => 37,
            Genre::Military => 38,
            Genre::Police => 39,
            Genre::Psychological => 40,
            Genre::Suspense => 41,
            Genre::Seinen => 42,
            Genre::Josei => 43,
            Genre::Isekai => 62,
        }
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Lowercase and drop separators so `slice-of-life`, `Slice of Life` and
/// `sliceoflife` compare equal.
fn normalize_genre_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for Genre {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_genre_name(s);
        Genre::ALL
            .into_iter()
            .find(|genre| {
                normalize_genre_name(genre.name()) == wanted
                    || normalize_genre_name(&format!("{genre:?}")) == wanted
            })
            .ok_or_else(|| UnknownVariant {
                kind: "genre",
                value: s.to_string(),
            })
    }
}

/// Everything a list page request can be narrowed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub page: NonZeroU32,
    pub page_size: NonZeroU32,
    pub sort: SortMode,
    pub search: Option<String>,
    pub genre: Option<Genre>,
}

impl ListQuery {
    pub fn new(page_size: NonZeroU32) -> Self {
        Self {
            page: NonZeroU32::MIN,
            page_size,
            sort: SortMode::default(),
            search: None,
            genre: None,
        }
    }

    pub fn descriptor(&self) -> RequestDescriptor {
        let mut descriptor = RequestDescriptor::new("/anime")
            .with_param("page", self.page)
            .with_param("limit", self.page_size);

        // Sent verbatim, only URL encoding applies.
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            descriptor = descriptor.with_param("q", search);
        }
        if let Some(genre) = self.genre {
            descriptor = descriptor.with_param("genres", genre.mal_id());
        }

        descriptor
            .with_param("order_by", self.sort.order_by())
            .with_param("sort", self.sort.sort_direction())
    }
}

pub fn build_list_query(
    page: NonZeroU32,
    page_size: NonZeroU32,
    sort: SortMode,
    search: Option<&str>,
) -> RequestDescriptor {
    ListQuery {
        page,
        page_size,
        sort,
        search: search.map(ToString::to_string),
        genre: None,
    }
    .descriptor()
}

/// The three requests making up one detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailQueries {
    pub primary: RequestDescriptor,
    pub characters: RequestDescriptor,
    pub staff: RequestDescriptor,
}

pub fn build_detail_queries(id: u64) -> DetailQueries {
    DetailQueries {
        primary: RequestDescriptor::new(format!("/anime/{id}")),
        characters: RequestDescriptor::new(format!("/anime/{id}/characters")),
        staff: RequestDescriptor::new(format!("/anime/{id}/staff")),
    }
}

pub fn build_top_query(limit: NonZeroU32, kind: Option<AnimeType>) -> RequestDescriptor {
    let descriptor = RequestDescriptor::new("/top/anime");
    let descriptor = match kind {
        Some(kind) => descriptor.with_param("type", kind),
        None => descriptor,
    };
    descriptor.with_param("limit", limit)
}

pub fn build_season_now_query() -> RequestDescriptor {
    RequestDescriptor::new("/seasons/now")
}

pub fn build_season_upcoming_query() -> RequestDescriptor {
    RequestDescriptor::new("/seasons/upcoming")
}

pub const TRENDING_LIMIT: NonZeroU32 = NonZeroU32::new(5).unwrap();
pub const FEED_LIMIT: NonZeroU32 = NonZeroU32::new(10).unwrap();

/// Requests behind the home feed, in the order they are issued:
/// trending, popular, current season, upcoming season, top movies.
pub fn home_feed_queries() -> [RequestDescriptor; 5] {
    [
        build_top_query(TRENDING_LIMIT, None),
        build_top_query(FEED_LIMIT, None),
        build_season_now_query(),
        build_season_upcoming_query(),
        build_top_query(FEED_LIMIT, Some(AnimeType::Movie)),
    ]
}
