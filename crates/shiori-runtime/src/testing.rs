//! In-memory backend used by the store tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};

use shiori_api::traits::{FriendsBackend, ListBackend};
use shiori_api::types::{EntryAck, EntryUpdate, FriendRequest, RawList, UserSummary};
use shiori_api::ApiError;
use shiori_core::models::{AnimeRef, Subject};

#[derive(Debug, Clone)]
pub(crate) enum Failure {
    Network,
    Status(u16, &'static str),
}

impl Failure {
    fn into_error(self) -> ApiError {
        match self {
            Self::Network => ApiError::Network("connection refused".into()),
            Self::Status(status, message) => ApiError::Api {
                status,
                message: message.into(),
            },
        }
    }
}

#[derive(Default)]
struct FakeState {
    catalog: HashMap<String, AnimeRef>,
    mine: Vec<Value>,
    others: HashMap<String, Vec<Value>>,
    fail_next: Option<Failure>,
    offline: bool,
    anime_fetches: usize,
    next_entry: usize,
    list_delays: HashMap<Subject, Duration>,
    mutation_delay: Option<Duration>,
    friends: Vec<UserSummary>,
    pending: Vec<FriendRequest>,
    sent: Vec<String>,
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<FakeState>,
}

pub(crate) fn anime(id: &str, title: &str) -> AnimeRef {
    AnimeRef {
        id: id.into(),
        title: title.into(),
        genre: vec!["Drama".into()],
        description: format!("{title} description"),
        image: None,
    }
}

pub(crate) fn user(id: &str, username: &str) -> UserSummary {
    UserSummary {
        id: id.into(),
        username: username.into(),
        email: None,
        avatar: "a.png".into(),
    }
}

fn entry_anime_id(value: &Value) -> Option<&str> {
    let field = value.get("animeId")?;
    field
        .as_str()
        .or_else(|| field.get("_id").and_then(Value::as_str))
}

fn not_found() -> ApiError {
    ApiError::Api {
        status: 404,
        message: "Not found".into(),
    }
}

impl FakeBackend {
    pub(crate) fn with_catalog(animes: impl IntoIterator<Item = AnimeRef>) -> Self {
        let backend = Self::default();
        {
            let mut state = backend.lock();
            for anime in animes {
                state.catalog.insert(anime.id.clone(), anime);
            }
        }
        backend
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn seed_entry(&self, value: Value) {
        self.lock().mine.push(value);
    }

    pub(crate) fn seed_user_list(&self, user_id: &str, values: Vec<Value>) {
        self.lock().others.insert(user_id.into(), values);
    }

    pub(crate) fn fail_next(&self, failure: Failure) {
        self.lock().fail_next = Some(failure);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub(crate) fn set_list_delay(&self, subject: Subject, delay: Duration) {
        self.lock().list_delays.insert(subject, delay);
    }

    pub(crate) fn set_mutation_delay(&self, delay: Duration) {
        self.lock().mutation_delay = Some(delay);
    }

    pub(crate) fn anime_fetches(&self) -> usize {
        self.lock().anime_fetches
    }

    /// The caller's stored entry for an anime, as the server would hold it.
    pub(crate) fn stored_entry(&self, anime_id: &str) -> Option<Value> {
        self.lock()
            .mine
            .iter()
            .find(|v| entry_anime_id(v) == Some(anime_id))
            .cloned()
    }

    pub(crate) fn stored_len(&self) -> usize {
        self.lock().mine.len()
    }

    pub(crate) fn seed_friend(&self, friend: UserSummary) {
        self.lock().friends.push(friend);
    }

    pub(crate) fn seed_request(&self, id: &str, from: UserSummary) {
        self.lock().pending.push(FriendRequest {
            id: id.into(),
            from: Some(from),
        });
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    /// Fail if offline or a failure was queued.
    fn gate(&self) -> Result<(), ApiError> {
        let mut state = self.lock();
        if state.offline {
            return Err(Failure::Network.into_error());
        }
        match state.fail_next.take() {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }

    async fn mutation_pause(&self) {
        let delay = self.lock().mutation_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn with_entry<T>(
        &self,
        anime_id: &str,
        f: impl FnOnce(&mut Value) -> T,
    ) -> Result<T, ApiError> {
        let mut state = self.lock();
        let entry = state
            .mine
            .iter_mut()
            .find(|v| entry_anime_id(v) == Some(anime_id))
            .ok_or_else(not_found)?;
        Ok(f(entry))
    }
}

impl ListBackend for FakeBackend {
    async fn fetch_entries(&self, subject: &Subject) -> Result<RawList, ApiError> {
        let delay = self.lock().list_delays.get(subject).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.gate()?;
        let state = self.lock();
        let values = match subject {
            Subject::Me => state.mine.clone(),
            Subject::User(id) => state.others.get(id).cloned().ok_or_else(not_found)?,
        };
        Ok(RawList::from_values(values))
    }

    async fn fetch_anime(&self, anime_id: &str) -> Result<AnimeRef, ApiError> {
        let mut state = self.lock();
        state.anime_fetches += 1;
        if state.offline {
            return Err(Failure::Network.into_error());
        }
        state.catalog.get(anime_id).cloned().ok_or_else(not_found)
    }

    async fn add_entry(&self, anime_id: &str) -> Result<EntryAck, ApiError> {
        self.mutation_pause().await;
        self.gate()?;
        let mut state = self.lock();
        if !state.catalog.contains_key(anime_id) {
            return Err(not_found());
        }
        if state.mine.iter().any(|v| entry_anime_id(v) == Some(anime_id)) {
            return Err(ApiError::Api {
                status: 400,
                message: "Anime already in list".into(),
            });
        }
        state.next_entry += 1;
        let entry = json!({
            "_id": format!("e{}", state.next_entry),
            "animeId": anime_id,
            "status": "plan",
            "favorite": false,
            "addedAt": Utc::now().to_rfc3339(),
        });
        state.mine.push(entry.clone());
        Ok(EntryAck::from_value(&entry, anime_id))
    }

    async fn update_entry(
        &self,
        anime_id: &str,
        update: &EntryUpdate,
    ) -> Result<EntryAck, ApiError> {
        self.mutation_pause().await;
        self.gate()?;
        let patch = serde_json::to_value(update).unwrap();
        self.with_entry(anime_id, |entry| {
            if let (Some(entry), Some(patch)) = (entry.as_object_mut(), patch.as_object()) {
                for (key, value) in patch {
                    entry.insert(key.clone(), value.clone());
                }
            }
            EntryAck::from_value(entry, anime_id)
        })
    }

    async fn toggle_favorite(&self, anime_id: &str) -> Result<EntryAck, ApiError> {
        self.mutation_pause().await;
        self.gate()?;
        self.with_entry(anime_id, |entry| {
            let favorite = !entry["favorite"].as_bool().unwrap_or(false);
            entry["favorite"] = json!(favorite);
            EntryAck::from_value(entry, anime_id)
        })
    }

    async fn delete_entry(&self, anime_id: &str) -> Result<(), ApiError> {
        self.mutation_pause().await;
        self.gate()?;
        let mut state = self.lock();
        let before = state.mine.len();
        state.mine.retain(|v| entry_anime_id(v) != Some(anime_id));
        if state.mine.len() == before {
            return Err(not_found());
        }
        Ok(())
    }
}

impl FriendsBackend for FakeBackend {
    async fn fetch_friends(&self) -> Result<Vec<UserSummary>, ApiError> {
        self.gate()?;
        Ok(self.lock().friends.clone())
    }

    async fn fetch_pending_requests(&self) -> Result<Vec<FriendRequest>, ApiError> {
        Ok(self.lock().pending.clone())
    }

    async fn fetch_sent_request_targets(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.lock().sent.clone())
    }

    async fn send_request(&self, to_user_id: &str) -> Result<(), ApiError> {
        self.gate()?;
        let mut state = self.lock();
        if state.sent.iter().any(|id| id == to_user_id)
            || state.friends.iter().any(|f| f.id == to_user_id)
        {
            return Err(ApiError::Api {
                status: 400,
                message: "Request already sent".into(),
            });
        }
        state.sent.push(to_user_id.into());
        Ok(())
    }

    async fn accept_request(&self, request_id: &str) -> Result<(), ApiError> {
        self.gate()?;
        let mut state = self.lock();
        let pos = state
            .pending
            .iter()
            .position(|r| r.id == request_id)
            .ok_or_else(not_found)?;
        let request = state.pending.remove(pos);
        if let Some(from) = request.from {
            state.friends.push(from);
        }
        Ok(())
    }

    async fn reject_request(&self, request_id: &str) -> Result<(), ApiError> {
        self.gate()?;
        let mut state = self.lock();
        let before = state.pending.len();
        state.pending.retain(|r| r.id != request_id);
        if state.pending.len() == before {
            return Err(not_found());
        }
        Ok(())
    }

    async fn remove_friend(&self, friend_id: &str) -> Result<(), ApiError> {
        self.gate()?;
        let mut state = self.lock();
        let before = state.friends.len();
        state.friends.retain(|f| f.id != friend_id);
        if state.friends.len() == before {
            return Err(not_found());
        }
        Ok(())
    }
}
