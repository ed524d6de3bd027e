//! Error handling for catalog API operations.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Boxed cause of a transport level failure.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a single request against the catalog API.
///
/// Transport failures ([FetchError::Network], [FetchError::Timeout]) are kept
/// apart from [FetchError::Decode] so callers can tell
/// "upstream is down" from "upstream changed shape".
#[derive(Debug, Error)]
pub enum FetchError {
    /// No response was received.
    #[error("request to '{endpoint}' failed")]
    Network {
        endpoint: String,
        #[source]
        source: BoxedCause,
    },
    /// A response was received, but with a non-2xx status.
    #[error("request to '{endpoint}' returned {status}")]
    HttpStatus { endpoint: String, status: StatusCode },
    /// The response body is missing fields we rely on.
    #[error("unexpected response from '{endpoint}' at '{path}': {message}")]
    Decode {
        endpoint: String,
        path: String,
        message: String,
    },
    #[error("request to '{endpoint}' timed out after {}ms", after.as_millis())]
    Timeout { endpoint: String, after: Duration },
    #[error("page {page} is out of range (1..={total_pages})")]
    PageOutOfRange { page: u32, total_pages: u64 },
    #[error("could not build a url for '{endpoint}'")]
    InvalidUrl {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
}

impl FetchError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Only transport failures qualify; a status code (4xx in particular) is
    /// the server's answer and asking again changes nothing.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Network { .. })
    }

    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn decode(
        endpoint: impl Into<String>,
        path: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        FetchError::Decode {
            endpoint: endpoint.into(),
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// A sequence stopped at the request at `index`.
///
/// Payloads of the requests before `index` are retained in `completed`;
/// requests after `index` were never dispatched.
#[derive(Debug, Error)]
#[error("request {index} of the sequence failed")]
pub struct SequenceError {
    pub index: usize,
    pub completed: Vec<Value>,
    #[source]
    pub source: FetchError,
}

/// Errors constructing a [crate::CatalogClient].
#[derive(Debug, Error)]
pub enum CatalogClientError {
    #[error("invalid catalog url '{url}'")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid header '{0}'")]
    InvalidHeader(String),
    #[error("could not build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_errors_are_transient() {
        let network = FetchError::Network {
            endpoint: "/anime".into(),
            source: "connection reset".into(),
        };
        let not_found = FetchError::HttpStatus {
            endpoint: "/anime/1".into(),
            status: StatusCode::NOT_FOUND,
        };
        let timeout = FetchError::Timeout {
            endpoint: "/anime".into(),
            after: Duration::from_secs(1),
        };

        assert!(network.is_transient());
        assert!(!not_found.is_transient());
        assert!(!timeout.is_transient());
        assert_eq!(not_found.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(network.status(), None);
    }

    #[test]
    fn decode_error_names_the_path() {
        let err = FetchError::decode("/anime", "pagination.items.total", "missing field");
        assert_eq!(
            err.to_string(),
            "unexpected response from '/anime' at 'pagination.items.total': missing field"
        );
    }
}
