use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

/// Maximum number of events retained in the ring buffer.
const EVENT_LOG_CAPACITY: usize = 200;

/// Which store mutation an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Add,
    SetStatus,
    SetNotes,
    ToggleFavorite,
    Remove,
    SendFriendRequest,
    AcceptFriendRequest,
    RejectFriendRequest,
    RemoveFriend,
}

impl std::fmt::Display for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::SetStatus => "set status",
            Self::SetNotes => "set notes",
            Self::ToggleFavorite => "toggle favorite",
            Self::Remove => "remove",
            Self::SendFriendRequest => "send friend request",
            Self::AcceptFriendRequest => "accept friend request",
            Self::RejectFriendRequest => "reject friend request",
            Self::RemoveFriend => "remove friend",
        };
        f.write_str(name)
    }
}

/// Something a store did that a UI may want to surface.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    ListLoaded {
        entries: usize,
        dropped: usize,
    },
    LoadFailed {
        source: String,
        message: String,
    },
    /// An entry whose anime reference could not be resolved.
    EntryDropped {
        entry_id: Option<String>,
        reason: String,
    },
    /// A status token the vocabulary doesn't know.
    UnknownStatus {
        anime_id: String,
        raw: String,
    },
    MutationApplied {
        mutation: Mutation,
        target: String,
    },
    MutationFailed {
        mutation: Mutation,
        target: String,
        message: String,
    },
    /// An optimistic local change was undone after the remote call failed.
    RolledBack {
        mutation: Mutation,
        target: String,
    },
}

impl StoreEvent {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::LoadFailed { .. } | Self::MutationFailed { .. } | Self::EntryDropped { .. }
        )
    }
}

/// A timestamped event entry.
pub type EventEntry = (DateTime<Utc>, StoreEvent);

/// Bounded ring buffer of store events.
#[derive(Debug)]
pub struct EventLog {
    entries: VecDeque<EventEntry>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(EVENT_LOG_CAPACITY),
        }
    }

    /// Push a new event, evicting the oldest if at capacity.
    pub fn push(&mut self, event: StoreEvent) {
        if self.entries.len() >= EVENT_LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back((Utc::now(), event));
    }

    /// Return a snapshot of all entries (newest last).
    pub fn snapshot(&self) -> Vec<EventEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Failures only, newest last.
    pub fn failures(&self) -> Vec<EventEntry> {
        self.entries
            .iter()
            .filter(|(_, e)| e.is_failure())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Thread-safe handle to the event log.
pub type SharedEventLog = Arc<Mutex<EventLog>>;

/// Create a new shared event log.
pub fn shared_event_log() -> SharedEventLog {
    Arc::new(Mutex::new(EventLog::new()))
}

/// Push onto a shared log. A poisoned lock drops the event.
pub fn record(log: &SharedEventLog, event: StoreEvent) {
    if let Ok(mut log) = log.lock() {
        log.push(event);
    }
}
