mod browse;
mod genres;
mod home;
mod show;
mod spotlight;

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use indoc::indoc;
use jikan_catalog::{CatalogClient, MockTransport};
use tracing::debug;

use crate::config::AnidexConfig;

static ANIDEX_DESCRIPTION: &'_ str = indoc! {"
    Browse the anime catalog from the terminal.

    Requests are spaced out to respect the catalog's rate limit,
    so commands that load several sections take a few seconds."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(ANIDEX_DESCRIPTION))]
pub struct AnidexCli(#[bpaf(external(anidex_args))] pub AnidexArgs);

/// Main anidex args parser
///
/// To parse the anidex CLI, use [`AnidexCli`] via [`anidex_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)]
pub struct AnidexArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    /// Read configuration from this file instead of the default location
    #[bpaf(long("config"), argument("PATH"))]
    pub config: Option<PathBuf>,

    #[bpaf(external(commands))]
    command: Commands,
}

impl AnidexArgs {
    pub async fn handle(self) -> Result<()> {
        let config = AnidexConfig::parse(self.config.as_deref())?;
        debug!(?config, "parsed config");

        match self.command {
            Commands::Genres(args) => args.handle(),
            Commands::Browse(args) => args.handle(&catalog_client(&config)?).await,
            Commands::Show(args) => args.handle(&catalog_client(&config)?).await,
            Commands::Home(args) => args.handle(&catalog_client(&config)?).await,
            Commands::Spotlight(args) => {
                args.handle(&config, &catalog_client(&config)?).await
            },
        }
    }
}

/// Create a catalog client, answering from canned responses if configured
pub fn catalog_client(config: &AnidexConfig) -> Result<CatalogClient> {
    let client_config = config.client_config()?;

    match &config.mock_data {
        Some(path) => {
            debug!(path = %path.display(), "using mock catalog client");
            let transport = MockTransport::from_file(path)
                .with_context(|| format!("Could not load mock data from {}", path.display()))?;
            Ok(CatalogClient::with_transport(client_config, transport.into()))
        },
        None => CatalogClient::new(client_config).context("Could not create catalog client"),
    }
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// Browse the catalog one page at a time
    #[bpaf(command)]
    Browse(#[bpaf(external(browse::browse))] browse::Browse),

    /// Show an anime with its characters and staff
    #[bpaf(command)]
    Show(#[bpaf(external(show::show))] show::Show),

    /// Show the trending, popular, seasonal, upcoming and top movie lists
    #[bpaf(command)]
    Home(#[bpaf(external(home::home))] home::Home),

    /// Cycle through the trending titles
    #[bpaf(command)]
    Spotlight(#[bpaf(external(spotlight::spotlight))] spotlight::Spotlight),

    /// List the categories that can be browsed
    #[bpaf(command)]
    Genres(#[bpaf(external(genres::genres))] genres::Genres),
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command")
    }
}
