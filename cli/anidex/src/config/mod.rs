use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use jikan_catalog::{
    CatalogClientConfig,
    DEFAULT_AUTO_ADVANCE_INTERVAL,
    DEFAULT_BASE_URL,
    DEFAULT_INTER_REQUEST_DELAY,
    DEFAULT_PAGE_SIZE,
    DEFAULT_REQUEST_TIMEOUT,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of anidex managed directories
const ANIDEX_DIR_NAME: &str = "anidex";
pub const ANIDEX_CONFIG_FILE: &str = "anidex.toml";
/// Prefix of environment variables overriding config values
const ANIDEX_ENV_PREFIX: &str = "ANIDEX";

/// Describes the configuration of anidex
///
/// Read from (later sources win):
/// built in defaults, `$XDG_CONFIG_HOME/anidex/anidex.toml` (or the file
/// passed with `--config`), `ANIDEX_*` environment variables.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnidexConfig {
    /// Base URL of the catalog API
    pub base_url: String,
    /// Milliseconds to wait between two requests
    pub inter_request_delay_ms: u64,
    /// Items per list page
    pub page_size: u32,
    /// Per request timeout in seconds, `0` disables the timeout
    pub request_timeout_secs: u64,
    /// How often a request is retried after a network failure
    pub network_retries: u8,
    pub user_agent: Option<String>,
    /// Additional headers sent with every request
    pub headers: BTreeMap<String, String>,
    /// Milliseconds between two spotlight entries
    pub auto_advance_ms: u64,
    /// Answer requests from a file of canned responses instead of the network
    pub mock_data: Option<PathBuf>,
}

impl Default for AnidexConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            inter_request_delay_ms: DEFAULT_INTER_REQUEST_DELAY.as_millis() as u64,
            page_size: DEFAULT_PAGE_SIZE.get(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            network_retries: 0,
            user_agent: None,
            headers: BTreeMap::new(),
            auto_advance_ms: DEFAULT_AUTO_ADVANCE_INTERVAL.as_millis() as u64,
            mock_data: None,
        }
    }
}

impl AnidexConfig {
    /// Creates an [AnidexConfig] from the config file and environment
    ///
    /// An explicitly passed `config_file` has to exist, the default one is
    /// optional.
    pub fn parse(config_file: Option<&Path>) -> Result<AnidexConfig> {
        let environment = Environment::with_prefix(ANIDEX_ENV_PREFIX).try_parsing(true);
        Self::parse_with(config_file, environment)
    }

    fn parse_with(config_file: Option<&Path>, environment: Environment) -> Result<AnidexConfig> {
        let (path, required) = match config_file {
            Some(path) => (Some(path.to_path_buf()), true),
            None => (default_config_file(), false),
        };

        let mut builder = HierarchicalConfig::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), required, "reading config file");
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(required),
            );
        }

        let final_config = builder
            .add_source(environment)
            .build()
            .context("Could not read config")?;

        final_config
            .try_deserialize()
            .context("Could not parse config")
    }

    pub fn inter_request_delay(&self) -> Duration {
        Duration::from_millis(self.inter_request_delay_ms)
    }

    pub fn auto_advance_interval(&self) -> Duration {
        Duration::from_millis(self.auto_advance_ms)
    }

    /// Client configuration described by this config
    pub fn client_config(&self) -> Result<CatalogClientConfig> {
        let default_page_size =
            NonZeroU32::new(self.page_size).context("'page_size' must be greater than zero")?;

        Ok(CatalogClientConfig {
            base_url: self.base_url.clone(),
            inter_request_delay: self.inter_request_delay(),
            default_page_size,
            request_timeout: (self.request_timeout_secs > 0)
                .then(|| Duration::from_secs(self.request_timeout_secs)),
            network_retries: self.network_retries,
            user_agent: self.user_agent.clone(),
            extra_headers: self.headers.clone(),
        })
    }
}

fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(ANIDEX_DIR_NAME).join(ANIDEX_CONFIG_FILE))
}
