//! Plain text rendering of catalog data.

use std::fmt::Write;

use indoc::formatdoc;
use itertools::Itertools;
use jikan_catalog::CatalogItem;
use jikan_catalog::CatalogPage;
use jikan_catalog::types::{CharacterEntry, NamedResource, StaffEntry};

/// Width for wrapped text, never narrower than 40 columns.
pub fn terminal_width() -> usize {
    textwrap::termwidth().max(40)
}

/// One line per item, e.g. `  5114  Fullmetal Alchemist: Brotherhood  TV, 64 eps, score 9.1, #1`
pub fn item_line(item: &CatalogItem) -> String {
    format!(
        "{id:>6}  {title}  {kind}, {episodes} eps, score {score}, {rank}",
        id = item.mal_id,
        title = item.title,
        kind = item.kind.as_deref().unwrap_or(jikan_catalog::types::UNAVAILABLE),
        episodes = item.display_episodes(),
        score = item.display_score(),
        rank = item.display_rank(),
    )
}

pub fn page_summary(page: &CatalogPage) -> String {
    if page.total_count == 0 {
        return "No results".to_string();
    }
    format!(
        "Page {} of {} ({} results)",
        page.page_number,
        page.total_pages(),
        page.total_count
    )
}

pub fn page(page: &CatalogPage) -> String {
    let mut out = String::new();
    for item in &page.items {
        let _ = writeln!(out, "{}", item_line(item));
    }
    let _ = writeln!(out);
    let _ = write!(out, "{}", page_summary(page));
    out
}

fn names(resources: &[NamedResource]) -> String {
    if resources.is_empty() {
        return jikan_catalog::types::UNAVAILABLE.to_string();
    }
    resources.iter().map(|resource| &resource.name).join(", ")
}

/// Header and synopsis of a detail page.
pub fn detail(item: &CatalogItem, width: usize) -> String {
    let english = item
        .title_english
        .as_deref()
        .filter(|english| *english != item.title)
        .map(|english| format!(" / {english}"))
        .unwrap_or_default();
    let season = item
        .display_season()
        .map(|season| format!(", {season}"))
        .unwrap_or_default();
    let synopsis = item
        .synopsis
        .as_deref()
        .map(|synopsis| textwrap::fill(synopsis, width))
        .unwrap_or_else(|| "No synopsis available.".to_string());

    formatdoc! {"
        {title}{english}
        {kind}, {episodes} eps, {status}{season}
        Score {score} | Rank {rank} | Members {members}
        Genres: {genres}
        Studios: {studios}

        {synopsis}",
        title = item.title,
        kind = item.kind.as_deref().unwrap_or(jikan_catalog::types::UNAVAILABLE),
        episodes = item.display_episodes(),
        status = item.status.as_deref().unwrap_or(jikan_catalog::types::UNAVAILABLE),
        score = item.display_score(),
        rank = item.display_rank(),
        members = item.display_members(),
        genres = names(&item.genres),
        studios = names(&item.studios),
    }
}

pub fn characters(entries: &[CharacterEntry]) -> String {
    if entries.is_empty() {
        return "Characters: none listed".to_string();
    }
    let lines = entries.iter().map(|entry| {
        let role = entry.role.as_deref().unwrap_or(jikan_catalog::types::UNAVAILABLE);
        match entry.lead_voice_actor() {
            Some(actor) => format!("  {} ({role}), voiced by {}", entry.character.name, actor.name),
            None => format!("  {} ({role})", entry.character.name),
        }
    });
    format!("Characters:\n{}", lines.format("\n"))
}

pub fn staff(entries: &[StaffEntry]) -> String {
    if entries.is_empty() {
        return "Staff: none listed".to_string();
    }
    let lines = entries
        .iter()
        .map(|entry| format!("  {}: {}", entry.person.name, entry.positions.join(", ")));
    format!("Staff:\n{}", lines.format("\n"))
}

/// A titled home feed section.
pub fn section(title: &str, items: &[CatalogItem]) -> String {
    let mut out = format!("== {title} ==");
    if items.is_empty() {
        out.push_str("\n  (empty)");
    }
    for item in items {
        let _ = write!(out, "\n{}", item_line(item));
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn item(value: serde_json::Value) -> CatalogItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_values_render_as_unavailable() {
        let item = item(json!({ "mal_id": 1, "title": "Unknown" }));
        assert_eq!(item_line(&item), "     1  Unknown  N/A, N/A eps, score N/A, N/A");
    }

    #[test]
    fn item_line_shows_rank_and_score() {
        let item = item(json!({
            "mal_id": 5114,
            "title": "Fullmetal Alchemist: Brotherhood",
            "type": "TV",
            "episodes": 64,
            "score": 9.1,
            "rank": 1
        }));
        assert_eq!(
            item_line(&item),
            "  5114  Fullmetal Alchemist: Brotherhood  TV, 64 eps, score 9.1, #1"
        );
    }

    #[test]
    fn summary_of_an_empty_page() {
        let page = CatalogPage {
            items: vec![],
            total_count: 0,
            page_size: 24,
            page_number: 1,
        };
        assert_eq!(page_summary(&page), "No results");
    }

    #[test]
    fn summary_counts_pages() {
        let page = CatalogPage {
            items: vec![],
            total_count: 100,
            page_size: 24,
            page_number: 2,
        };
        assert_eq!(page_summary(&page), "Page 2 of 5 (100 results)");
    }

    #[test]
    fn detail_wraps_synopsis() {
        let item = item(json!({
            "mal_id": 1,
            "title": "Cowboy Bebop",
            "synopsis": "one two three four five six seven eight nine ten"
        }));
        let rendered = detail(&item, 20);
        assert!(rendered.starts_with("Cowboy Bebop\n"), "{rendered}");
        assert!(rendered.ends_with("one two three four\nfive six seven eight\nnine ten"), "{rendered}");
        assert!(rendered.contains("Genres: N/A"));
    }

    #[test]
    fn characters_name_their_voice_actor() {
        let entries: Vec<CharacterEntry> = serde_json::from_value(json!([
            {
                "character": { "mal_id": 1, "name": "Spiegel, Spike" },
                "role": "Main",
                "voice_actors": [{ "person": { "mal_id": 2, "name": "Yamadera, Kouichi" }, "language": "Japanese" }]
            },
            { "character": { "mal_id": 3, "name": "Ein" }, "role": "Supporting" }
        ]))
        .unwrap();

        assert_eq!(
            characters(&entries),
            "Characters:\n  Spiegel, Spike (Main), voiced by Yamadera, Kouichi\n  Ein (Supporting)"
        );
        assert_eq!(characters(&[]), "Characters: none listed");
    }

    #[test]
    fn empty_section_is_marked() {
        assert_eq!(section("Upcoming", &[]), "== Upcoming ==\n  (empty)");
    }
}
