//! The current user's (or a viewed friend's) anime list.
//!
//! Loading resolves every entry to a full [`AnimeRef`] and a normalized status.
//! Mutations go through the backend and are reconciled locally:
//!
//! | operation         | local change                         |
//! |-------------------|--------------------------------------|
//! | `add`             | after success                        |
//! | `set_status`      | after success only                   |
//! | `set_notes`       | after success only                   |
//! | `toggle_favorite` | immediately, reverted on failure     |
//! | `remove`          | after success                        |
//!
//! Mutations on the same anime are serialized with a per-anime async mutex, so
//! once they settle the local entry reflects the last acknowledged result.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::{OwnedMutexGuard, RwLock};

use shiori_api::traits::ListBackend;
use shiori_api::types::{EntryUpdate, RawAnimeField, RawEntry};
use shiori_api::ApiError;
use shiori_core::event_log::{record, Mutation, SharedEventLog, StoreEvent};
use shiori_core::models::{filter, AnimeRef, ListEntry, ListFilter, ListStats, Subject};
use shiori_core::status::{normalize, EntryStatus, Status};

use crate::error::StoreError;

#[derive(Debug, Default)]
struct ListState {
    subject: Subject,
    entries: Vec<ListEntry>,
}

impl ListState {
    fn find_mut(&mut self, anime_id: &str) -> Option<&mut ListEntry> {
        self.entries.iter_mut().find(|e| e.anime_id() == anime_id)
    }
}

pub struct WatchListStore<B> {
    backend: B,
    state: RwLock<ListState>,
    entry_locks: EntryLocks,
    generation: AtomicU64,
    closed: AtomicBool,
    events: SharedEventLog,
}

impl<B: ListBackend> WatchListStore<B> {
    pub fn new(backend: B, events: SharedEventLog) -> Self {
        Self {
            backend,
            state: RwLock::new(ListState::default()),
            entry_locks: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            events,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn events(&self) -> &SharedEventLog {
        &self.events
    }

    /// Stop applying results of loads still in flight.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // ── Reads ───────────────────────────────────────────────────

    pub async fn subject(&self) -> Subject {
        self.state.read().await.subject.clone()
    }

    pub async fn entries(&self) -> Vec<ListEntry> {
        self.state.read().await.entries.clone()
    }

    pub async fn get(&self, anime_id: &str) -> Option<ListEntry> {
        let state = self.state.read().await;
        state.entries.iter().find(|e| e.anime_id() == anime_id).cloned()
    }

    pub async fn filtered(&self, selector: ListFilter) -> Vec<ListEntry> {
        let state = self.state.read().await;
        filter(&state.entries, selector).into_iter().cloned().collect()
    }

    pub async fn stats(&self) -> ListStats {
        ListStats::from_entries(&self.state.read().await.entries)
    }

    // ── Load ────────────────────────────────────────────────────

    /// Load a user's list. Never fails: on error the list is empty and the
    /// cause goes to the event log.
    pub async fn load(&self, subject: Subject) -> Vec<ListEntry> {
        self.try_load(subject).await.unwrap_or_default()
    }

    /// Like [`load`](Self::load) but hands the error back as well.
    #[tracing::instrument(name = "load_list", skip(self))]
    pub async fn try_load(&self, subject: Subject) -> Result<Vec<ListEntry>, StoreError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let result = self.fetch_normalized(&subject).await;

        let entries = match &result {
            Ok(entries) => entries.clone(),
            Err(e) => {
                tracing::warn!(error = %e, "list load failed");
                record(
                    &self.events,
                    StoreEvent::LoadFailed {
                        source: "watch list".into(),
                        message: e.to_string(),
                    },
                );
                Vec::new()
            }
        };

        let mut state = self.state.write().await;
        if self.is_closed() || self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "discarding stale list load");
        } else {
            state.subject = subject;
            state.entries = entries;
        }
        drop(state);

        result
    }

    async fn fetch_normalized(&self, subject: &Subject) -> Result<Vec<ListEntry>, StoreError> {
        let raw = self.backend.fetch_entries(subject).await?;

        for reason in &raw.malformed {
            self.drop_entry(None, format!("malformed entry: {reason}"));
        }

        let received = raw.entries.len() + raw.malformed.len();
        let resolved = join_all(raw.entries.into_iter().map(|e| self.resolve(e))).await;

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(resolved.len());
        for entry in resolved.into_iter().flatten() {
            if seen.insert(entry.anime_id().to_string()) {
                entries.push(entry);
            } else {
                self.drop_entry(
                    Some(entry.id.clone()),
                    format!("duplicate entry for anime {}", entry.anime_id()),
                );
            }
        }

        let dropped = received - entries.len();
        tracing::info!(entries = entries.len(), dropped, "list loaded");
        record(
            &self.events,
            StoreEvent::ListLoaded {
                entries: entries.len(),
                dropped,
            },
        );
        Ok(entries)
    }

    /// Turn a raw entry into a displayable one, fetching the anime when only
    /// its id came back. `None` drops the entry.
    async fn resolve(&self, raw: RawEntry) -> Option<ListEntry> {
        let anime = match &raw.anime {
            None => {
                self.drop_entry(raw.id.clone(), "entry has no anime reference".into());
                return None;
            }
            Some(RawAnimeField::Doc(doc)) if doc.is_populated() => {
                match doc.clone().into_anime_ref() {
                    Some(anime) => anime,
                    None => {
                        self.drop_entry(raw.id.clone(), "embedded anime has no id".into());
                        return None;
                    }
                }
            }
            Some(field) => {
                let Some(anime_id) = field.id() else {
                    self.drop_entry(raw.id.clone(), "anime reference has no id".into());
                    return None;
                };
                match self.backend.fetch_anime(anime_id).await {
                    Ok(anime) => anime,
                    Err(e) => {
                        self.drop_entry(
                            raw.id.clone(),
                            format!("anime {anime_id} could not be resolved: {e}"),
                        );
                        return None;
                    }
                }
            }
        };

        let status = normalize(raw.status.as_deref());
        if let EntryStatus::Unknown(token) = &status {
            tracing::warn!(anime_id = %anime.id, status = %token, "unrecognized status token");
            record(
                &self.events,
                StoreEvent::UnknownStatus {
                    anime_id: anime.id.clone(),
                    raw: token.clone(),
                },
            );
        }

        let added_at = raw.added_at();
        Some(ListEntry {
            id: raw.id.unwrap_or_else(|| local_entry_id(&anime.id)),
            status,
            favorite: raw.favorite.unwrap_or(false),
            notes: raw.notes.filter(|n| !n.is_empty()),
            added_at,
            anime,
        })
    }

    fn drop_entry(&self, entry_id: Option<String>, reason: String) {
        tracing::warn!(entry_id = ?entry_id, %reason, "dropping list entry");
        record(&self.events, StoreEvent::EntryDropped { entry_id, reason });
    }

    // ── Mutations ───────────────────────────────────────────────

    /// Add an anime to the caller's list as a planned, non-favorite entry.
    pub async fn add(&self, anime: &AnimeRef) -> Result<ListEntry, StoreError> {
        self.ensure_own_list().await?;
        if anime.id.is_empty() {
            return Err(StoreError::DataShapeUnexpected("anime has no id".into()));
        }

        let _guard = self.lock_entry(&anime.id).await;

        let already_local = self.get(&anime.id).await.is_some();
        let ack = match self.backend.add_entry(&anime.id).await {
            Ok(ack) => ack,
            Err(e) => {
                let err = match e {
                    ApiError::Api { status, message }
                        if status == 409
                            || (status == 400 && already_local)
                            || message.to_lowercase().contains("already") =>
                    {
                        StoreError::AlreadyInList {
                            anime_id: anime.id.clone(),
                        }
                    }
                    other => other.into(),
                };
                return Err(self.mutation_failed(Mutation::Add, &anime.id, err));
            }
        };

        let entry = ListEntry::new(
            ack.entry_id.unwrap_or_else(|| local_entry_id(&anime.id)),
            anime.clone(),
            ack.added_at.unwrap_or_else(Utc::now),
        );

        {
            let mut state = self.state.write().await;
            match state.find_mut(&anime.id) {
                Some(existing) => *existing = entry.clone(),
                None => state.entries.push(entry.clone()),
            }
        }
        self.mutation_applied(Mutation::Add, &anime.id);
        Ok(entry)
    }

    /// Change an entry's status. Local state only changes once the backend
    /// accepted it.
    pub async fn set_status(&self, anime_id: &str, status: Status) -> Result<(), StoreError> {
        self.ensure_own_list().await?;
        let _guard = self.lock_entry(anime_id).await;

        if let Err(e) = self
            .backend
            .update_entry(anime_id, &EntryUpdate::status(status))
            .await
        {
            return Err(self.mutation_failed(Mutation::SetStatus, anime_id, e.into()));
        }

        if let Some(entry) = self.state.write().await.find_mut(anime_id) {
            entry.status = EntryStatus::Known(status);
        }
        self.mutation_applied(Mutation::SetStatus, anime_id);
        Ok(())
    }

    /// Replace an entry's note. `None` or an empty string clears it.
    pub async fn set_notes(&self, anime_id: &str, notes: Option<String>) -> Result<(), StoreError> {
        self.ensure_own_list().await?;
        let _guard = self.lock_entry(anime_id).await;

        let notes = notes.filter(|n| !n.trim().is_empty());
        let update = EntryUpdate::notes(notes.clone().unwrap_or_default());
        if let Err(e) = self.backend.update_entry(anime_id, &update).await {
            return Err(self.mutation_failed(Mutation::SetNotes, anime_id, e.into()));
        }

        if let Some(entry) = self.state.write().await.find_mut(anime_id) {
            entry.notes = notes;
        }
        self.mutation_applied(Mutation::SetNotes, anime_id);
        Ok(())
    }

    /// Flip the favorite flag and return the new value. The local flag flips
    /// right away and is put back if the backend call fails.
    pub async fn toggle_favorite(&self, anime_id: &str) -> Result<bool, StoreError> {
        self.ensure_own_list().await?;
        let _guard = self.lock_entry(anime_id).await;

        let previous = self.state.write().await.find_mut(anime_id).map(|entry| {
            let previous = entry.favorite;
            entry.favorite = !previous;
            previous
        });

        match self.backend.toggle_favorite(anime_id).await {
            Ok(ack) => {
                if let Some(favorite) = ack.favorite {
                    if let Some(entry) = self.state.write().await.find_mut(anime_id) {
                        entry.favorite = favorite;
                    }
                }
                self.mutation_applied(Mutation::ToggleFavorite, anime_id);
                Ok(ack
                    .favorite
                    .or(previous.map(|p| !p))
                    .unwrap_or_default())
            }
            Err(e) => {
                if let Some(previous) = previous {
                    // A load may have replaced the entry meanwhile; only undo our own flip.
                    let rolled_back = match self.state.write().await.find_mut(anime_id) {
                        Some(entry) if entry.favorite != previous => {
                            entry.favorite = previous;
                            true
                        }
                        _ => false,
                    };
                    if rolled_back {
                        tracing::debug!(anime_id, "favorite toggle rolled back");
                        record(
                            &self.events,
                            StoreEvent::RolledBack {
                                mutation: Mutation::ToggleFavorite,
                                target: anime_id.to_string(),
                            },
                        );
                    }
                }
                Err(self.mutation_failed(Mutation::ToggleFavorite, anime_id, e.into()))
            }
        }
    }

    /// Delete an entry from the caller's list.
    pub async fn remove(&self, anime_id: &str) -> Result<(), StoreError> {
        self.ensure_own_list().await?;
        let _guard = self.lock_entry(anime_id).await;

        if let Err(e) = self.backend.delete_entry(anime_id).await {
            return Err(self.mutation_failed(Mutation::Remove, anime_id, e.into()));
        }

        self.state
            .write()
            .await
            .entries
            .retain(|e| e.anime_id() != anime_id);
        self.mutation_applied(Mutation::Remove, anime_id);
        Ok(())
    }

    // ── Helpers ─────────────────────────────────────────────────

    async fn ensure_own_list(&self) -> Result<(), StoreError> {
        if self.state.read().await.subject.is_me() {
            Ok(())
        } else {
            Err(StoreError::ReadOnly)
        }
    }

    async fn lock_entry(&self, anime_id: &str) -> EntryGuard<'_> {
        let lock = self
            .entry_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(anime_id.to_string())
            .or_default()
            .clone();
        EntryGuard {
            locks: &self.entry_locks,
            anime_id: anime_id.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    fn mutation_applied(&self, mutation: Mutation, anime_id: &str) {
        tracing::debug!(%mutation, anime_id, "mutation applied");
        record(
            &self.events,
            StoreEvent::MutationApplied {
                mutation,
                target: anime_id.to_string(),
            },
        );
    }

    fn mutation_failed(&self, mutation: Mutation, anime_id: &str, err: StoreError) -> StoreError {
        tracing::warn!(%mutation, anime_id, error = %err, "mutation failed");
        record(
            &self.events,
            StoreEvent::MutationFailed {
                mutation,
                target: anime_id.to_string(),
                message: err.to_string(),
            },
        );
        err
    }
}

type EntryLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Held while one mutation runs on an anime. The last holder removes the
/// anime's mutex from the map.
struct EntryGuard<'a> {
    locks: &'a EntryLocks,
    anime_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for EntryGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = locks.get(&self.anime_id) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(&self.anime_id);
            }
        }
    }
}

/// Entry id used until the backend hands out a real one.
fn local_entry_id(anime_id: &str) -> String {
    format!("local:{anime_id}")
}
