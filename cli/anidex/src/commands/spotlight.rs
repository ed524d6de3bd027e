use anyhow::{Context, Result};
use bpaf::Bpaf;
use jikan_catalog::query::TRENDING_LIMIT;
use jikan_catalog::{AutoAdvance, CatalogClient};
use tracing::{debug, instrument};

use crate::config::AnidexConfig;
use crate::utils::{message, render};

// Cycle through the trending titles
#[derive(Debug, Bpaf, Clone)]
pub struct Spotlight {
    /// How often to advance, defaults to one full round
    #[bpaf(long, argument("N"))]
    pub cycles: Option<usize>,
}

impl Spotlight {
    #[instrument(name = "spotlight", skip_all, fields(cycles = self.cycles))]
    pub async fn handle(self, config: &AnidexConfig, client: &CatalogClient) -> Result<()> {
        let trending = client
            .load_top(TRENDING_LIMIT, None)
            .await
            .context("Could not load trending titles")?
            .items;

        if trending.is_empty() {
            message::warning("Nothing is trending right now");
            return Ok(());
        }

        let mut auto_advance = AutoAdvance::new(trending.len(), config.auto_advance_interval());
        let cycles = self.cycles.unwrap_or(trending.len());

        let show = |index: usize| {
            if let Some(item) = trending.get(index) {
                println!("[{}/{}] {}", index + 1, trending.len(), render::item_line(item));
            }
        };

        tokio::select! {
            _ = run(&mut auto_advance, cycles, show) => {},
            _ = tokio::signal::ctrl_c() => debug!("spotlight interrupted"),
        }
        Ok(())
    }
}

/// Show the current entry, then advance `cycles` times on the timer.
async fn run(auto_advance: &mut AutoAdvance, cycles: usize, mut show: impl FnMut(usize)) {
    let Some(first) = auto_advance.current() else {
        return;
    };
    show(first);
    for _ in 0..cycles {
        show(auto_advance.tick().await);
    }
}
