use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use bpaf::Bpaf;
use futures::{StreamExt, pin_mut};
use jikan_catalog::{CatalogClient, CompositeDetailView, DetailPart, FetchState};
use serde_json::json;
use tracing::{debug, instrument};

use crate::utils::{message, render};

// Show an anime with its characters and staff
#[derive(Debug, Bpaf, Clone)]
pub struct Show {
    /// Print the settled view as JSON instead of printing sections as they arrive
    #[bpaf(long)]
    pub json: bool,

    /// Catalog id of the anime, as shown by 'anidex browse'
    #[bpaf(positional("ID"))]
    pub id: u64,
}

impl Show {
    #[instrument(name = "show", skip_all, fields(id = self.id, json = self.json))]
    pub async fn handle(self, client: &CatalogClient) -> Result<()> {
        let snapshots = client.load_composite_detail(self.id);
        pin_mut!(snapshots);

        let mut printed = BTreeSet::new();
        let mut settled = None;
        while let Some(view) = snapshots.next().await {
            if !self.json {
                for section in newly_settled_sections(&view, &mut printed) {
                    println!("{section}\n");
                }
            }
            settled = Some(view);
        }

        let Some(view) = settled else {
            return Ok(());
        };
        debug!(failed = ?view.partial_failure(), "detail view settled");

        if self.json {
            println!("{}", serde_json::to_string(&view_json(&view))?);
        }

        if let FetchState::Failed(err) = view.primary_state() {
            return Err(anyhow::Error::new(Arc::clone(err))
                .context(format!("Could not load anime {}", self.id)));
        }
        Ok(())
    }
}

/// Render the parts of `view` that settled since the last call.
fn newly_settled_sections(view: &CompositeDetailView, printed: &mut BTreeSet<DetailPart>) -> Vec<String> {
    let mut sections = Vec::new();
    for part in DetailPart::ALL {
        if !view.is_part_settled(part) || !printed.insert(part) {
            continue;
        }
        if let Some(err) = view.failure(part) {
            // the primary failure is reported as the command's error
            if part != DetailPart::Primary {
                message::warning(format!("Could not load {}: {err}", part_name(part)));
            }
            continue;
        }
        let section = match part {
            DetailPart::Primary => view
                .primary()
                .map(|item| render::detail(item, render::terminal_width())),
            DetailPart::Characters => view.characters().map(render::characters),
            DetailPart::Staff => view.staff().map(render::staff),
        };
        sections.extend(section);
    }
    sections
}

fn part_name(part: DetailPart) -> &'static str {
    match part {
        DetailPart::Primary => "details",
        DetailPart::Characters => "characters",
        DetailPart::Staff => "staff",
    }
}

fn view_json(view: &CompositeDetailView) -> serde_json::Value {
    json!({
        "id": view.id(),
        "anime": view.primary(),
        "characters": view.characters(),
        "staff": view.staff(),
        "failed": view.partial_failure(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jikan_catalog::{CatalogClientConfig, MockResponse, MockTransport};
    use pretty_assertions::assert_eq;

    use super::*;

    fn client(responses: Vec<MockResponse>) -> CatalogClient {
        let config = CatalogClientConfig {
            inter_request_delay: Duration::ZERO,
            ..Default::default()
        };
        CatalogClient::with_transport(config, MockTransport::new(responses).into())
    }

    #[tokio::test]
    async fn sections_are_rendered_once() {
        let client = client(vec![
            MockResponse::Json(json!({ "data": { "mal_id": 1, "title": "Cowboy Bebop" } })),
            MockResponse::Status(500),
            MockResponse::Json(json!({ "data": [] })),
        ]);

        let snapshots: Vec<_> = client.load_composite_detail(1).collect().await;
        let mut printed = BTreeSet::new();

        let first = newly_settled_sections(&snapshots[0], &mut printed);
        assert_eq!(first.len(), 1);
        assert!(first[0].starts_with("Cowboy Bebop"));

        // failed characters section is reported, not rendered
        assert!(newly_settled_sections(&snapshots[1], &mut printed).is_empty());

        let last = newly_settled_sections(&snapshots[2], &mut printed);
        assert_eq!(last, vec!["Staff: none listed".to_string()]);
        assert_eq!(printed.len(), 3);
    }

    #[tokio::test]
    async fn json_lists_failed_parts() {
        let client = client(vec![
            MockResponse::Json(json!({ "data": { "mal_id": 1, "title": "Cowboy Bebop" } })),
            MockResponse::Json(json!({ "data": [] })),
            MockResponse::NetworkFailure("connection reset".to_string()),
        ]);

        let view = client.load_detail(1).await;
        let value = view_json(&view);
        assert_eq!(value["failed"], json!(["staff"]));
        assert_eq!(value["anime"]["title"], json!("Cowboy Bebop"));
        assert_eq!(value["characters"], json!([]));
        assert_eq!(value["staff"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn missing_anime_is_an_error() {
        let client = client(vec![
            MockResponse::Status(404),
            MockResponse::Json(json!({ "data": [] })),
            MockResponse::Json(json!({ "data": [] })),
        ]);

        let show = Show { json: true, id: 9999 };
        let err = show.handle(&client).await.unwrap_err();
        assert!(err.to_string().contains("Could not load anime 9999"), "{err}");
    }
}
