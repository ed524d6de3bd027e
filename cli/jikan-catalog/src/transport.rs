//! The single capability the catalog core needs from the outside world:
//! turn a [RequestDescriptor] into JSON or an error.

use std::collections::VecDeque;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use enum_dispatch::enum_dispatch;
use reqwest::header::{self, HeaderMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::CatalogClientConfig;
use crate::descriptor::RequestDescriptor;
use crate::error::{CatalogClientError, FetchError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Sends a single request.
///
/// Implementations report failures, they never retry or wait; pacing and
/// retries belong to [crate::RequestSequencer].
#[allow(async_fn_in_trait)]
#[enum_dispatch]
pub trait TransportTrait {
    async fn send(&self, descriptor: &RequestDescriptor) -> Result<Value, FetchError>;
}

/// Either HTTP against the real catalog, or canned responses for testing.
#[derive(Debug, Clone)]
#[enum_dispatch(TransportTrait)]
pub enum Transport {
    Http(HttpTransport),
    Mock(MockTransport),
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    request_timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new(config: &CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let base_url =
            Url::parse(&config.base_url).map_err(|source| CatalogClientError::InvalidBaseUrl {
                url: config.base_url.clone(),
                source,
            })?;

        Ok(Self {
            client: build_http_client(config)?,
            base_url,
            request_timeout: config.request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl TransportTrait for HttpTransport {
    async fn send(&self, descriptor: &RequestDescriptor) -> Result<Value, FetchError> {
        let url = descriptor.url(&self.base_url)?;
        let endpoint = descriptor.endpoint();
        debug!(%url, "sending catalog request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.map_reqwest_error(endpoint, err))?;

        let status = response.status();
        if !status.is_success() {
            debug!(endpoint, %status, "catalog request failed");
            return Err(FetchError::HttpStatus {
                endpoint: endpoint.to_string(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| self.map_reqwest_error(endpoint, err))?;

        let deserializer = &mut serde_json::Deserializer::from_slice(&body);
        serde_path_to_error::deserialize(deserializer)
            .map_err(|err| FetchError::decode(endpoint, err.path().to_string(), err.into_inner()))
    }
}

impl HttpTransport {
    fn map_reqwest_error(&self, endpoint: &str, err: reqwest::Error) -> FetchError {
        match self.request_timeout {
            Some(after) if err.is_timeout() => FetchError::Timeout {
                endpoint: endpoint.to_string(),
                after,
            },
            _ => FetchError::Network {
                endpoint: endpoint.to_string(),
                source: Box::new(err),
            },
        }
    }
}

/// Build the HTTP client used for all catalog requests.
fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key)
                .map_err(|_| CatalogClientError::InvalidHeader(key.clone()))?,
            header::HeaderValue::from_str(value)
                .map_err(|_| CatalogClientError::InvalidHeader(key.clone()))?,
        );
    }

    debug!(
        base_url = %config.base_url,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT);

    let client_builder = match config.request_timeout {
        Some(timeout) => client_builder.timeout(timeout),
        None => client_builder,
    };

    let client_builder = match config.user_agent {
        Some(ref user_agent) => client_builder.user_agent(user_agent),
        None => client_builder.user_agent(concat!("jikan-catalog/", env!("CARGO_PKG_VERSION"))),
    };

    client_builder.build().map_err(CatalogClientError::HttpClient)
}

// ---------------------------------------------------------------------------
// Mock
// ---------------------------------------------------------------------------

/// A canned answer for the next request a [MockTransport] receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum MockResponse {
    /// 2xx with this body.
    Json(Value),
    /// Non-2xx with this status code.
    Status(u16),
    /// No response at all.
    NetworkFailure(String),
    /// Never answers.
    Hang,
}

#[derive(Debug, Error)]
pub enum MockDataError {
    #[error("failed to read mock response file")]
    ReadMockFile(#[source] std::io::Error),
    #[error("failed to parse mock data as JSON")]
    ParseJson(#[source] serde_json::Error),
}

/// A transport answering from a queue of [MockResponse]s, in order.
///
/// Clones share the queue and the request log, so a test can keep a handle
/// after moving the transport into a client.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    requests: Arc<Mutex<Vec<RequestDescriptor>>>,
}

impl MockTransport {
    pub fn new(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().collect())),
            requests: Default::default(),
        }
    }

    /// Read a JSON array of [MockResponse]s.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MockDataError> {
        let contents = std::fs::read_to_string(path).map_err(MockDataError::ReadMockFile)?;
        let responses: Vec<MockResponse> =
            serde_json::from_str(&contents).map_err(MockDataError::ParseJson)?;
        Ok(Self::new(responses))
    }

    pub fn push_response(&self, response: MockResponse) {
        self.responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(response);
    }

    /// Every descriptor sent so far, in order.
    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses
            .lock()
            .expect("couldn't acquire mock lock")
            .len()
    }
}

impl TransportTrait for MockTransport {
    async fn send(&self, descriptor: &RequestDescriptor) -> Result<Value, FetchError> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .push(descriptor.clone());

        let next = self
            .responses
            .lock()
            .expect("couldn't acquire mock lock")
            .pop_front();
        let endpoint = descriptor.endpoint().to_string();

        match next {
            Some(MockResponse::Json(body)) => Ok(body),
            Some(MockResponse::Status(code)) => Err(FetchError::HttpStatus {
                endpoint,
                status: http::StatusCode::from_u16(code)
                    .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR),
            }),
            Some(MockResponse::NetworkFailure(message)) => Err(FetchError::Network {
                endpoint,
                source: message.into(),
            }),
            Some(MockResponse::Hang) => futures::future::pending().await,
            None => Err(FetchError::Network {
                endpoint,
                source: "no mock response left".into(),
            }),
        }
    }
}
