use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::anime::AnimeRef;
use crate::status::{EntryStatus, Status};

/// One user's relationship to one anime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    pub id: String,
    pub anime: AnimeRef,
    pub status: EntryStatus,
    pub favorite: bool,
    pub notes: Option<String>,
    pub added_at: Option<DateTime<Utc>>,
}

impl ListEntry {
    /// A freshly added entry: planned, not a favorite.
    pub fn new(id: String, anime: AnimeRef, added_at: DateTime<Utc>) -> Self {
        Self {
            id,
            anime,
            status: EntryStatus::Known(Status::Plan),
            favorite: false,
            notes: None,
            added_at: Some(added_at),
        }
    }

    pub fn anime_id(&self) -> &str {
        &self.anime.id
    }
}

/// Selector for the list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    #[default]
    All,
    Status(Status),
    Favorites,
}

impl ListFilter {
    /// Every selector in display order.
    pub fn all() -> Vec<ListFilter> {
        let mut filters = vec![Self::All];
        filters.extend(Status::ALL.iter().copied().map(Self::Status));
        filters.push(Self::Favorites);
        filters
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Status(s) => s.label(),
            Self::Favorites => "Favorites",
        }
    }

    pub fn matches(&self, entry: &ListEntry) -> bool {
        match self {
            Self::All => true,
            Self::Status(s) => entry.status.known() == Some(*s),
            Self::Favorites => entry.favorite,
        }
    }
}

impl std::str::FromStr for ListFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "favorites" | "favourites" | "fav" => Ok(Self::Favorites),
            _ => s.parse::<Status>().map(Self::Status),
        }
    }
}

/// Entries matching `selector`, in their original order.
pub fn filter<'a>(entries: &'a [ListEntry], selector: ListFilter) -> Vec<&'a ListEntry> {
    entries.iter().filter(|e| selector.matches(e)).collect()
}

/// Per-status counts for the statistics view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ListStats {
    pub plan: usize,
    pub watching: usize,
    pub completed: usize,
    pub on_hold: usize,
    pub dropped: usize,
    pub unknown: usize,
    pub favorites: usize,
    pub total: usize,
}

impl ListStats {
    pub fn from_entries(entries: &[ListEntry]) -> Self {
        let mut stats = Self {
            total: entries.len(),
            ..Default::default()
        };
        for entry in entries {
            if entry.favorite {
                stats.favorites += 1;
            }
            match entry.status.known() {
                Some(Status::Plan) => stats.plan += 1,
                Some(Status::Watching) => stats.watching += 1,
                Some(Status::Completed) => stats.completed += 1,
                Some(Status::OnHold) => stats.on_hold += 1,
                Some(Status::Dropped) => stats.dropped += 1,
                None => stats.unknown += 1,
            }
        }
        stats
    }

    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Plan => self.plan,
            Status::Watching => self.watching,
            Status::Completed => self.completed,
            Status::OnHold => self.on_hold,
            Status::Dropped => self.dropped,
        }
    }
}
