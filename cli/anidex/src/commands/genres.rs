use anyhow::Result;
use bpaf::Bpaf;
use itertools::Itertools;
use jikan_catalog::Genre;

// List the categories that can be browsed
#[derive(Debug, Bpaf, Clone)]
pub struct Genres {}

impl Genres {
    pub fn handle(self) -> Result<()> {
        println!("{}", render_genres());
        Ok(())
    }
}

fn render_genres() -> String {
    Genre::ALL
        .iter()
        .map(|genre| format!("{:>4}  {genre}", genre.mal_id()))
        .join("\n")
}
