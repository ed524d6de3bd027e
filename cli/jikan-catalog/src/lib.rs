//! Rate-limit aware client for the Jikan anime catalog API.
//!
//! This crate provides:
//! - Pure builders for the catalog's list, detail, top and season requests
//! - A request sequencer that issues requests one at a time with a minimum
//!   delay between them, as the public API demands
//! - Aggregation of raw responses into pages, composite detail views that
//!   tolerate partial failure, and the home feed
//! - A carousel state machine for rotating through feed entries
//!
//! ## Usage
//!
//! ```ignore
//! use jikan_catalog::{CatalogClient, CatalogClientConfig, ListQuery, SortMode};
//!
//! let client = CatalogClient::new(CatalogClientConfig::default())?;
//! let query = ListQuery {
//!     sort: SortMode::Newest,
//!     ..client.list_query()
//! };
//! let page = client.list_page(&query).await?;
//! ```

mod aggregator;
mod carousel;
mod client;
mod config;
mod descriptor;
mod error;
pub mod query;
mod sequencer;
mod transport;
pub mod types;

pub use aggregator::{CompositeDetailView, DetailPart};
pub use carousel::{AutoAdvance, Carousel, DEFAULT_AUTO_ADVANCE_INTERVAL};
pub use client::CatalogClient;
pub use config::{
    CatalogClientConfig,
    DEFAULT_BASE_URL,
    DEFAULT_INTER_REQUEST_DELAY,
    DEFAULT_PAGE_SIZE,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use descriptor::RequestDescriptor;
pub use error::{BoxedCause, CatalogClientError, FetchError, SequenceError};
pub use query::{AnimeType, Genre, ListQuery, SortMode};
pub use reqwest::StatusCode;
pub use sequencer::RequestSequencer;
pub use transport::{
    HttpTransport,
    MockDataError,
    MockResponse,
    MockTransport,
    Transport,
    TransportTrait,
};
pub use types::{CatalogItem, CatalogPage, FetchState, HomeFeed};
