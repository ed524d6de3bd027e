//! Configuration types for catalog client construction.

use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::time::Duration;

/// Public Jikan v4 endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.jikan.moe/v4";
/// Spacing that keeps unauthenticated clients below Jikan's rate limit.
pub const DEFAULT_INTER_REQUEST_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(24).unwrap();
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for catalog client construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogClientConfig {
    /// Base URL for the catalog API.
    pub base_url: String,
    /// Minimum idle time between one request settling and the next dispatch.
    pub inter_request_delay: Duration,
    /// Page size used when the caller does not ask for one.
    pub default_page_size: NonZeroU32,
    /// Upper bound for a single request, `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// How often a request is repeated after a network failure.
    pub network_retries: u8,
    /// User agent sent with every request.
    pub user_agent: Option<String>,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            inter_request_delay: DEFAULT_INTER_REQUEST_DELAY,
            default_page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            network_retries: 0,
            user_agent: None,
            extra_headers: BTreeMap::new(),
        }
    }
}
