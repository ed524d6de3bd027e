//! Catalog client: one transport behind one request sequencer.

use std::fmt::Debug;

use crate::config::CatalogClientConfig;
use crate::error::CatalogClientError;
use crate::query::ListQuery;
use crate::sequencer::RequestSequencer;
use crate::transport::{HttpTransport, Transport};

/// A client for the catalog service.
///
/// Every request made through one client shares its [RequestSequencer], so
/// rate-limit spacing holds across all operations of the client. Loads
/// return owned values; no fetched data is kept in the client.
pub struct CatalogClient {
    pub(crate) sequencer: RequestSequencer,
    config: CatalogClientConfig,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.config.base_url)
            .field("inter_request_delay", &self.config.inter_request_delay)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new HTTP catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport.into()))
    }

    /// Create a client on top of an arbitrary transport, e.g. a
    /// [crate::MockTransport].
    pub fn with_transport(config: CatalogClientConfig, transport: Transport) -> Self {
        let sequencer = RequestSequencer::new(transport, &config);
        Self { sequencer, config }
    }

    pub fn config(&self) -> &CatalogClientConfig {
        &self.config
    }

    pub fn sequencer(&self) -> &RequestSequencer {
        &self.sequencer
    }

    /// First page, default sort and configured page size.
    pub fn list_query(&self) -> ListQuery {
        ListQuery::new(self.config.default_page_size)
    }
}
