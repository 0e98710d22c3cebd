use serde::{Deserialize, Serialize};

/// Catalog anime as the list layer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeRef {
    pub id: String,
    pub title: String,
    pub genre: Vec<String>,
    pub description: String,
    pub image: Option<String>,
}

impl AnimeRef {
    /// Genres joined for single-line display, `-` when there are none.
    pub fn genre_line(&self) -> String {
        if self.genre.is_empty() {
            "-".to_string()
        } else {
            self.genre.join(", ")
        }
    }
}
