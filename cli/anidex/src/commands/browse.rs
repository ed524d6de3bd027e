use std::num::NonZeroU32;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use jikan_catalog::{CatalogClient, Genre, ListQuery, SortMode};
use tracing::{debug, instrument};

use crate::utils::render;

// Browse the catalog one page at a time
#[derive(Debug, Bpaf, Clone)]
pub struct Browse {
    /// Page to show, starting at 1
    #[bpaf(long, argument("N"), fallback(NonZeroU32::MIN))]
    pub page: NonZeroU32,

    /// Order of the results: alpha, popular or newest
    #[bpaf(long, argument("MODE"), fallback(SortMode::default()))]
    pub sort: SortMode,

    /// Only show titles matching TEXT
    #[bpaf(long, argument("TEXT"))]
    pub search: Option<String>,

    /// Only show titles of this category, see 'anidex genres'
    #[bpaf(long, argument("NAME"))]
    pub genre: Option<Genre>,

    /// Print the page as JSON
    #[bpaf(long)]
    pub json: bool,
}

impl Browse {
    fn query(&self, client: &CatalogClient) -> ListQuery {
        ListQuery {
            page: self.page,
            sort: self.sort,
            search: self.search.clone(),
            genre: self.genre,
            ..client.list_query()
        }
    }

    #[instrument(name = "browse", skip_all, fields(page = %self.page, sort = %self.sort, json = self.json))]
    pub async fn handle(self, client: &CatalogClient) -> Result<()> {
        let query = self.query(client);
        debug!(request = %query.descriptor(), "browsing");

        let page = client
            .list_page(&query)
            .await
            .with_context(|| format!("Could not load page {}", self.page))?;

        if self.json {
            println!("{}", serde_json::to_string(&page)?);
        } else {
            println!("{}", render::page(&page));
        }
        Ok(())
    }
}
