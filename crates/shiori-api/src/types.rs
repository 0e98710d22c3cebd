use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shiori_core::models::profile::PLACEHOLDER_AVATAR;
use shiori_core::models::{AnimeRef, Profile};
use shiori_core::Status;

// ── Anime documents ─────────────────────────────────────────────

/// Anime document as the backend stores it. Every field is optional because
/// list entries sometimes embed a partially populated copy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAnime {
    #[serde(rename = "_id")]
    pub mongo_id: Option<String>,
    pub id: Option<String>,
    pub title: Option<String>,
    pub genre: Option<Vec<String>>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl RawAnime {
    pub fn id(&self) -> Option<&str> {
        self.mongo_id
            .as_deref()
            .or(self.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// Whether the document carries display data or only an id.
    pub fn is_populated(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// `None` unless both an id and a title are present.
    pub fn into_anime_ref(self) -> Option<AnimeRef> {
        let id = self.id()?.to_string();
        if !self.is_populated() {
            return None;
        }
        Some(AnimeRef {
            id,
            title: self.title.unwrap_or_default(),
            genre: self.genre.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            image: self.image.filter(|i| !i.is_empty()),
        })
    }
}

/// The `animeId` field of a list entry: a bare id or an embedded document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAnimeField {
    Id(String),
    Doc(RawAnime),
}

impl RawAnimeField {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id.as_str()).filter(|id| !id.is_empty()),
            Self::Doc(doc) => doc.id(),
        }
    }
}

// ── List entries ────────────────────────────────────────────────

/// A list entry exactly as the backend returned it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEntry {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(rename = "animeId")]
    pub anime: Option<RawAnimeField>,
    pub status: Option<String>,
    pub favorite: Option<bool>,
    pub notes: Option<String>,
    #[serde(rename = "addedAt")]
    pub added_at: Option<String>,
}

impl RawEntry {
    pub fn anime_id(&self) -> Option<&str> {
        self.anime.as_ref().and_then(RawAnimeField::id)
    }

    pub fn added_at(&self) -> Option<DateTime<Utc>> {
        self.added_at.as_deref().and_then(parse_timestamp)
    }
}

/// Entries of one list. Items that didn't deserialize at all are kept apart
/// so one bad row doesn't hide the rest.
#[derive(Debug, Default)]
pub struct RawList {
    pub entries: Vec<RawEntry>,
    pub malformed: Vec<String>,
}

impl RawList {
    pub fn from_values(values: Vec<Value>) -> Self {
        let mut list = Self::default();
        for value in values {
            match serde_json::from_value::<RawEntry>(value) {
                Ok(entry) => list.entries.push(entry),
                Err(e) => list.malformed.push(e.to_string()),
            }
        }
        list
    }
}

/// User document returned by `/api/user/me` and `/api/user/{id}`.
#[derive(Debug, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub animes: Vec<Value>,
}

impl UserDocument {
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id.clone(),
            username: self.username.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            avatar: self
                .avatar
                .clone()
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| PLACEHOLDER_AVATAR.to_string()),
        }
    }

    pub fn into_raw_list(self) -> RawList {
        RawList::from_values(self.animes)
    }
}

/// What a mutation response tells us about the entry it touched.
///
/// The backend answers mutations with either the entry itself or the owning
/// user's whole `animes` array, so everything here is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryAck {
    pub entry_id: Option<String>,
    pub status: Option<String>,
    pub favorite: Option<bool>,
    pub notes: Option<String>,
    pub added_at: Option<DateTime<Utc>>,
}

impl EntryAck {
    pub fn from_value(value: &Value, anime_id: &str) -> Self {
        if let Some(animes) = value.get("animes").and_then(Value::as_array) {
            return animes
                .iter()
                .filter_map(|v| serde_json::from_value::<RawEntry>(v.clone()).ok())
                .find(|e| e.anime_id() == Some(anime_id))
                .map(Self::from_entry)
                .unwrap_or_default();
        }
        for key in ["entry", "anime"] {
            if let Some(inner) = value.get(key).filter(|v| v.get("animeId").is_some()) {
                return Self::from_value(inner, anime_id);
            }
        }
        if value.get("animeId").is_some() {
            if let Ok(entry) = serde_json::from_value::<RawEntry>(value.clone()) {
                if entry.anime_id().is_none_or(|id| id == anime_id) {
                    return Self::from_entry(entry);
                }
            }
        }
        Self::default()
    }

    fn from_entry(entry: RawEntry) -> Self {
        let added_at = entry.added_at();
        Self {
            entry_id: entry.id,
            status: entry.status,
            favorite: entry.favorite,
            notes: entry.notes,
            added_at,
        }
    }
}

// ── Mutation bodies ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEntryRequest<'a> {
    pub anime_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

/// Partial update for `PATCH /api/user/my-animes/{animeId}`. Only `Some`
/// fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl EntryUpdate {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub avatar: String,
    /// Sent only when non-empty.
    #[serde(skip_serializing_if = "password_unchanged")]
    pub password: Option<String>,
}

fn password_unchanged(password: &Option<String>) -> bool {
    password.as_deref().is_none_or(str::is_empty)
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

// ── Users and friends ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct RawUser {
    #[serde(rename = "_id")]
    mongo_id: Option<String>,
    id: Option<String>,
    username: Option<String>,
    email: Option<String>,
    avatar: Option<String>,
}

/// Another user as shown in friend lists and search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawUser")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub avatar: String,
}

impl TryFrom<RawUser> for UserSummary {
    type Error = String;

    fn try_from(raw: RawUser) -> Result<Self, Self::Error> {
        let id = raw
            .mongo_id
            .or(raw.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| "user without id".to_string())?;
        Ok(Self {
            id,
            username: raw.username.unwrap_or_default(),
            email: raw.email,
            avatar: raw
                .avatar
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| PLACEHOLDER_AVATAR.to_string()),
        })
    }
}

/// Decode a list of users, skipping entries without an id.
pub fn users_from_values(values: Vec<Value>) -> Vec<UserSummary> {
    values
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FriendRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub from: Option<UserSummary>,
}

#[derive(Debug, Deserialize)]
pub struct FriendsResponse {
    #[serde(default)]
    pub friends: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequestsResponse {
    #[serde(default)]
    pub pending_requests: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentRequestsResponse {
    #[serde(default)]
    pub sent_requests: Vec<Value>,
}

impl SentRequestsResponse {
    /// Ids of the users the caller has already asked.
    pub fn target_ids(&self) -> Vec<String> {
        self.sent_requests
            .iter()
            .filter_map(|req| {
                let to = req.get("to")?;
                to.get("_id")
                    .or_else(|| to.get("id"))
                    .and_then(Value::as_str)
                    .or_else(|| to.as_str())
                    .map(str::to_string)
            })
            .filter(|id| !id.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<Value>,
}

// ── Auth ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(default, alias = "userId")]
    pub user_id: Option<String>,
    pub user: Option<Value>,
}

impl TokenResponse {
    pub fn user_id(&self) -> Option<String> {
        self.user_id.clone().or_else(|| {
            let user = self.user.as_ref()?;
            user.get("_id")
                .or_else(|| user.get("id"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────

/// Human-readable message from a failure body: its `message` or `error`
/// field when it is JSON, the trimmed text otherwise.
pub fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }
    body.trim().to_string()
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_user_document() {
        let json = r#"{
            "_id": "u1",
            "username": "yui",
            "email": "yui@example.com",
            "animes": [
                {
                    "_id": "e1",
                    "animeId": "A1",
                    "status": "viendo",
                    "favorite": true,
                    "addedAt": "2024-01-15T10:00:00.000Z"
                },
                {
                    "animeId": {
                        "_id": "A2",
                        "title": "Sousou no Frieren",
                        "genre": ["Adventure", "Fantasy"],
                        "image": "/img/frieren.jpg"
                    },
                    "status": null
                }
            ]
        }"#;

        let doc: UserDocument = serde_json::from_str(json).unwrap();
        let profile = doc.profile();
        assert_eq!(profile.username, "yui");
        assert_eq!(profile.avatar, PLACEHOLDER_AVATAR);

        let list = doc.into_raw_list();
        assert!(list.malformed.is_empty());
        assert_eq!(list.entries.len(), 2);

        let first = &list.entries[0];
        assert_eq!(first.anime_id(), Some("A1"));
        assert!(matches!(first.anime, Some(RawAnimeField::Id(_))));
        assert_eq!(first.favorite, Some(true));
        assert!(first.added_at().is_some());

        let second = &list.entries[1];
        assert_eq!(second.anime_id(), Some("A2"));
        assert!(second.status.is_none());
        let Some(RawAnimeField::Doc(doc)) = second.anime.clone() else {
            panic!("expected embedded anime");
        };
        let anime = doc.into_anime_ref().unwrap();
        assert_eq!(anime.title, "Sousou no Frieren");
        assert_eq!(anime.genre, vec!["Adventure", "Fantasy"]);
    }

    #[test]
    fn test_malformed_entries_are_set_aside() {
        let values = vec![
            serde_json::json!({ "animeId": "A1", "status": "plan" }),
            serde_json::json!({ "animeId": "A2", "favorite": "yes" }),
        ];
        let list = RawList::from_values(values);
        assert_eq!(list.entries.len(), 1);
        assert_eq!(list.malformed.len(), 1);
    }

    #[test]
    fn test_unpopulated_anime_doc() {
        let doc: RawAnime = serde_json::from_str(r#"{ "id": "A9" }"#).unwrap();
        assert_eq!(doc.id(), Some("A9"));
        assert!(!doc.is_populated());
        assert!(doc.into_anime_ref().is_none());
    }

    #[test]
    fn test_entry_ack_from_entry_and_user() {
        let entry = serde_json::json!({
            "_id": "e7", "animeId": "A1", "status": "plan", "favorite": false
        });
        let ack = EntryAck::from_value(&entry, "A1");
        assert_eq!(ack.entry_id.as_deref(), Some("e7"));
        assert_eq!(ack.favorite, Some(false));

        let user = serde_json::json!({
            "message": "ok",
            "animes": [
                { "_id": "e1", "animeId": "A0", "favorite": false },
                { "_id": "e2", "animeId": { "_id": "A1" }, "favorite": true }
            ]
        });
        let ack = EntryAck::from_value(&user, "A1");
        assert_eq!(ack.entry_id.as_deref(), Some("e2"));
        assert_eq!(ack.favorite, Some(true));

        let ack = EntryAck::from_value(&serde_json::json!({ "message": "deleted" }), "A1");
        assert_eq!(ack, EntryAck::default());
    }

    #[test]
    fn test_entry_update_sends_only_set_fields() {
        let body = serde_json::to_value(EntryUpdate::status(Status::OnHold)).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "on-hold" }));
    }

    #[test]
    fn test_profile_update_omits_empty_password() {
        let update = ProfileUpdate {
            username: "yui".into(),
            email: "yui@example.com".into(),
            avatar: "a.png".into(),
            password: Some(String::new()),
        };
        let body = serde_json::to_value(update).unwrap();
        assert!(body.get("password").is_none());
    }

    #[test]
    fn test_users_and_requests() {
        let users = users_from_values(vec![
            serde_json::json!({ "_id": "u2", "username": "mio" }),
            serde_json::json!({ "username": "ghost" }),
        ]);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "u2");

        let pending: PendingRequestsResponse = serde_json::from_str(
            r#"{ "pendingRequests": [ { "_id": "r1", "from": { "_id": "u3", "username": "ritsu" } } ] }"#,
        )
        .unwrap();
        let req: FriendRequest = serde_json::from_value(pending.pending_requests[0].clone()).unwrap();
        assert_eq!(req.from.unwrap().username, "ritsu");

        let sent: SentRequestsResponse = serde_json::from_str(
            r#"{ "sentRequests": [ { "to": { "_id": "u4" } }, { "to": null } ] }"#,
        )
        .unwrap();
        assert_eq!(sent.target_ids(), vec!["u4"]);
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"message":"Anime already in list"}"#),
            "Anime already in list"
        );
        assert_eq!(error_message(r#"{"error":"bad"}"#), "bad");
        assert_eq!(error_message("  Not Found \n"), "Not Found");
    }
}
