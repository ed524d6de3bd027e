use std::sync::OnceLock;

use tracing::{debug, error};
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;

static LOGGER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

/// Filter directives for a verbosity level.
pub(crate) fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,anidex=error,jikan_catalog=error",
        Verbosity::Verbose(0) => "off,anidex=warn,jikan_catalog=warn",
        Verbosity::Verbose(1) => "off,anidex=info,jikan_catalog=info",
        // Requests, pacing and retries
        Verbosity::Verbose(2) => "off,anidex=debug,jikan_catalog=debug",
        Verbosity::Verbose(3) => "off,anidex=trace,jikan_catalog=trace",
        // Also show the HTTP stack
        Verbosity::Verbose(4) => "debug,anidex=trace,jikan_catalog=trace",
        Verbosity::Verbose(_) => "trace",
    }
}

/// Install the global subscriber on first use, then only swap its filter.
///
/// Safe to call repeatedly as more is known about the requested verbosity.
pub(crate) fn init_logger(verbosity: Option<Verbosity>) {
    let verbosity = verbosity.unwrap_or_default();

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        let (filter, reload_handle) =
            tracing_subscriber::reload::Layer::new(EnvFilter::new("error"));
        let log_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);
        // another subscriber may be installed already, e.g. in tests
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(log_layer)
            .try_init();
        reload_handle
    });

    update_filters(filter_handle, log_filter(verbosity));
    debug!(?verbosity, "logger initialized");
}

/// `RUST_LOG` takes precedence over the verbosity flags.
pub fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}
