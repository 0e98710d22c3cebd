//! Client-side catalog browsing: genre filter, title search, sorting.

use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;

use crate::models::AnimeRef;

/// Genres offered by the catalog's genre picker.
pub const GENRES: &[&str] = &[
    "Action",
    "Adventure",
    "Romance",
    "Comedy",
    "Drama",
    "Fantasy",
    "Horror",
    "Supernatural",
    "Superheroes",
    "Historical",
    "Slice of Life",
    "Mecha",
    "Suspense",
    "Mystery",
    "Music",
    "Sci-Fi",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    TitleAsc,
    TitleDesc,
    /// Keep backend order.
    None,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title-asc" | "asc" => Ok(Self::TitleAsc),
            "title-desc" | "desc" => Ok(Self::TitleDesc),
            "none" => Ok(Self::None),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    /// `None` means every genre.
    pub genre: Option<String>,
    pub text: Option<String>,
    pub sort: SortOrder,
}

impl CatalogQuery {
    pub fn apply(&self, animes: &[AnimeRef]) -> Vec<AnimeRef> {
        let needle = self
            .text
            .as_deref()
            .map(|text| fold(text.trim()))
            .filter(|needle| !needle.is_empty());

        let mut result: Vec<AnimeRef> = animes
            .iter()
            .filter(|a| match &self.genre {
                Some(genre) => a.genre.iter().any(|g| g == genre),
                None => true,
            })
            .filter(|a| match &needle {
                Some(needle) => fold(&a.title).contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect();

        match self.sort {
            SortOrder::TitleAsc => result.sort_by(|a, b| compare_titles(&a.title, &b.title)),
            SortOrder::TitleDesc => result.sort_by(|a, b| compare_titles(&b.title, &a.title)),
            SortOrder::None => {}
        }
        result
    }
}

/// NFKC + lowercase, so fullwidth and composed forms match their plain spelling.
fn fold(s: &str) -> String {
    s.nfkc().collect::<String>().to_lowercase()
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anime(id: &str, title: &str, genre: &[&str]) -> AnimeRef {
        AnimeRef {
            id: id.into(),
            title: title.into(),
            genre: genre.iter().map(|g| g.to_string()).collect(),
            description: String::new(),
            image: None,
        }
    }

    fn catalog() -> Vec<AnimeRef> {
        vec![
            anime("1", "naruto", &["Action", "Adventure"]),
            anime("2", "Clannad", &["Drama", "Romance"]),
            anime("3", "Mob Psycho 100", &["Action", "Comedy"]),
        ]
    }

    #[test]
    fn test_default_sorts_title_ascending_case_insensitive() {
        let titles: Vec<_> = CatalogQuery::default()
            .apply(&catalog())
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["Clannad", "Mob Psycho 100", "naruto"]);
    }

    #[test]
    fn test_genre_and_text() {
        let query = CatalogQuery {
            genre: Some("Action".into()),
            text: Some("PSYCHO".into()),
            sort: SortOrder::None,
        };
        let ids: Vec<_> = query.apply(&catalog()).into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["3"]);
    }

    #[test]
    fn test_fullwidth_search_matches() {
        let query = CatalogQuery {
            text: Some("ＮＡＲＵＴＯ".into()),
            ..Default::default()
        };
        assert_eq!(query.apply(&catalog()).len(), 1);
    }

    #[test]
    fn test_descending_and_blank_text() {
        let query = CatalogQuery {
            text: Some("   ".into()),
            sort: SortOrder::TitleDesc,
            ..Default::default()
        };
        let ids: Vec<_> = query.apply(&catalog()).into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["1", "3", "2"]);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("title-desc".parse::<SortOrder>(), Ok(SortOrder::TitleDesc));
        assert!("random".parse::<SortOrder>().is_err());
    }
}
