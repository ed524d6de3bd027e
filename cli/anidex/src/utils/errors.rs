use std::sync::Arc;

use jikan_catalog::{FetchError, StatusCode};

/// The innermost [FetchError] in the cause chain of `err`, if any.
pub fn find_fetch_error(err: &anyhow::Error) -> Option<&FetchError> {
    err.chain().find_map(|cause| {
        cause
            .downcast_ref::<FetchError>()
            .or_else(|| cause.downcast_ref::<Arc<FetchError>>().map(|shared| &**shared))
    })
}

/// What the user can do about a failed request.
pub fn retry_hint(err: &FetchError) -> Option<&'static str> {
    match err {
        FetchError::HttpStatus { status, .. } if *status == StatusCode::TOO_MANY_REQUESTS => Some(
            "The catalog is limiting requests. Wait a moment and try again, or raise 'inter_request_delay_ms'.",
        ),
        FetchError::HttpStatus { status, .. } if *status == StatusCode::NOT_FOUND => {
            Some("Check the id, 'anidex browse' lists valid ones.")
        },
        FetchError::HttpStatus { status, .. } if status.is_server_error() => {
            Some("The catalog is having trouble. Run the command again to retry.")
        },
        FetchError::Network { .. } | FetchError::Timeout { .. } => {
            Some("The catalog could not be reached. Run the command again to retry.")
        },
        FetchError::PageOutOfRange { .. } => Some("Pick a page within the range shown."),
        _ => None,
    }
}

/// `err` and its causes on one line, separated by colons.
pub fn format_chain(err: &anyhow::Error) -> String {
    err.chain()
        .skip(1)
        .fold(err.to_string(), |acc, cause| format!("{}: {}", acc, cause))
}
