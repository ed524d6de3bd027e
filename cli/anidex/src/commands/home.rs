use anyhow::{Context, Result};
use bpaf::Bpaf;
use jikan_catalog::{CatalogClient, HomeFeed};
use tracing::instrument;

use crate::utils::{message, render};

// Show the home feed
#[derive(Debug, Bpaf, Clone)]
pub struct Home {
    /// Print the feed as JSON
    #[bpaf(long)]
    pub json: bool,
}

impl Home {
    #[instrument(name = "home", skip_all, fields(json = self.json))]
    pub async fn handle(self, client: &CatalogClient) -> Result<()> {
        message::plain("Loading the home feed, this takes a few seconds...");
        let feed = client
            .load_home_feed()
            .await
            .context("Could not load the home feed")?;

        if self.json {
            println!("{}", serde_json::to_string(&feed)?);
        } else {
            println!("{}", render_feed(&feed));
        }
        Ok(())
    }
}

fn render_feed(feed: &HomeFeed) -> String {
    [
        render::section("Trending", &feed.trending),
        render::section("Popular", &feed.popular),
        render::section("This season", &feed.seasonal),
        render::section("Upcoming", &feed.upcoming),
        render::section("Top movies", &feed.top_movies),
    ]
    .join("\n\n")
}
