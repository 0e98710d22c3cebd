use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use shiori_core::config::ApiConfig;
use shiori_core::models::{AnimeRef, Profile, Subject};
use shiori_core::session::Credential;

use crate::error::ApiError;
use crate::traits::{FriendsBackend, ListBackend};
use crate::types::{
    error_message, users_from_values, AddEntryRequest, ContactMessage, EntryAck, EntryUpdate,
    FriendRequest, FriendsResponse, PendingRequestsResponse, ProfileUpdate, RawAnime, RawList,
    SentRequestsResponse, UserDocument, UserSummary, UsersResponse,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// REST client for the anime-tracking backend.
///
/// The credential is fixed at construction; calls that need it fail with
/// [`ApiError::Unauthenticated`] when the client was built without one.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    credential: Option<Credential>,
    pub(crate) http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, credential: Option<Credential>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, credential, DEFAULT_TIMEOUT)
    }

    pub fn from_config(
        config: &ApiConfig,
        credential: Option<Credential>,
    ) -> Result<Self, ApiError> {
        Self::with_timeout(
            &config.base_url,
            credential,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn with_timeout(
        base_url: &str,
        credential: Option<Credential>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Invalid(format!("not a base URL: {base_url}")));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            credential,
            http,
        })
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Same client with a different credential, e.g. right after login.
    pub fn with_credential(&self, credential: Option<Credential>) -> Self {
        Self {
            credential,
            ..self.clone()
        }
    }

    /// Build `{base}/api/{segments...}`, percent-encoding each segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Invalid(format!("not a base URL: {}", self.base_url)))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let credential = self.credential.as_ref().ok_or(ApiError::Unauthenticated)?;
        Ok(request.header("Authorization", credential.bearer()))
    }

    /// Check the HTTP response for errors and return the body message on failure.
    pub(crate) async fn check_response(
        resp: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            let message = error_message(&body);
            tracing::warn!(status, %message, "backend API error");
            Err(ApiError::Api { status, message })
        }
    }

    async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        resp.json().await.map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Body as JSON, `Null` when empty. Mutation responses have no fixed shape.
    async fn read_value(resp: reqwest::Response) -> Result<Value, ApiError> {
        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let resp = request.send().await?;
        Self::check_response(resp).await
    }

    fn user_segments(subject: &Subject) -> Vec<&str> {
        match subject {
            Subject::Me => vec!["user", "me"],
            Subject::User(id) => vec!["user", id.as_str()],
        }
    }

    /// Profile and raw list entries of a user.
    pub async fn fetch_user(&self, subject: &Subject) -> Result<UserDocument, ApiError> {
        let url = self.endpoint(&Self::user_segments(subject))?;
        tracing::debug!(%url, "fetching user document");
        let resp = self.send(self.authorized(self.http.get(url))?).await?;
        Self::read_json(resp).await
    }

    pub async fn fetch_profile(&self, subject: &Subject) -> Result<Profile, ApiError> {
        Ok(self.fetch_user(subject).await?.profile())
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, ApiError> {
        let url = self.endpoint(&["user", "me"])?;
        let resp = self
            .send(self.authorized(self.http.patch(url))?.json(update))
            .await?;
        let value = Self::read_value(resp).await?;
        // Some deployments wrap the document in `user`.
        let doc = value.get("user").cloned().unwrap_or(value);
        let doc: UserDocument =
            serde_json::from_value(doc).map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(doc.profile())
    }

    /// Permanently delete the caller's account and list.
    pub async fn delete_account(&self) -> Result<(), ApiError> {
        let url = self.endpoint(&["user", "me"])?;
        self.send(self.authorized(self.http.delete(url))?).await?;
        Ok(())
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.endpoint(&["user", "search"])?;
        let resp = self
            .send(self.authorized(self.http.get(url).query(&[("q", query)]))?)
            .await?;
        let body: UsersResponse = Self::read_json(resp).await?;
        Ok(users_from_values(body.users))
    }

    /// The whole public catalog.
    pub async fn fetch_catalog(&self) -> Result<Vec<AnimeRef>, ApiError> {
        let url = self.endpoint(&["animes"])?;
        let resp = self.send(self.http.get(url)).await?;
        let docs: Vec<RawAnime> = Self::read_json(resp).await?;
        let total = docs.len();
        let animes: Vec<AnimeRef> = docs.into_iter().filter_map(RawAnime::into_anime_ref).collect();
        if animes.len() < total {
            tracing::warn!(skipped = total - animes.len(), "catalog records without id or title");
        }
        Ok(animes)
    }

    pub async fn send_contact(&self, message: &ContactMessage) -> Result<(), ApiError> {
        let url = self.endpoint(&["contact"])?;
        self.send(self.http.post(url).json(message)).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("credential", &self.credential)
            .finish()
    }
}

impl ListBackend for ApiClient {
    async fn fetch_entries(&self, subject: &Subject) -> Result<RawList, ApiError> {
        Ok(self.fetch_user(subject).await?.into_raw_list())
    }

    async fn fetch_anime(&self, anime_id: &str) -> Result<AnimeRef, ApiError> {
        let url = self.endpoint(&["animes", anime_id])?;
        let resp = self.send(self.http.get(url)).await?;
        let doc: RawAnime = Self::read_json(resp).await?;
        doc.into_anime_ref()
            .ok_or_else(|| ApiError::Parse(format!("anime {anime_id} has no id or title")))
    }

    async fn add_entry(&self, anime_id: &str) -> Result<EntryAck, ApiError> {
        let url = self.endpoint(&["user", "my-animes"])?;
        let body = AddEntryRequest {
            anime_id,
            status: None,
        };
        let resp = self
            .send(self.authorized(self.http.post(url))?.json(&body))
            .await?;
        let value = Self::read_value(resp).await?;
        Ok(EntryAck::from_value(&value, anime_id))
    }

    async fn update_entry(
        &self,
        anime_id: &str,
        update: &EntryUpdate,
    ) -> Result<EntryAck, ApiError> {
        let url = self.endpoint(&["user", "my-animes", anime_id])?;
        let resp = self
            .send(self.authorized(self.http.patch(url))?.json(update))
            .await?;
        let value = Self::read_value(resp).await?;
        Ok(EntryAck::from_value(&value, anime_id))
    }

    async fn toggle_favorite(&self, anime_id: &str) -> Result<EntryAck, ApiError> {
        let url = self.endpoint(&["user", "favorite", anime_id])?;
        let resp = self.send(self.authorized(self.http.patch(url))?).await?;
        let value = Self::read_value(resp).await?;
        Ok(EntryAck::from_value(&value, anime_id))
    }

    async fn delete_entry(&self, anime_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["user", "my-animes", anime_id])?;
        self.send(self.authorized(self.http.delete(url))?).await?;
        Ok(())
    }
}

impl FriendsBackend for ApiClient {
    async fn fetch_friends(&self) -> Result<Vec<UserSummary>, ApiError> {
        let url = self.endpoint(&["friends"])?;
        let resp = self.send(self.authorized(self.http.get(url))?).await?;
        let body: FriendsResponse = Self::read_json(resp).await?;
        Ok(users_from_values(body.friends))
    }

    async fn fetch_pending_requests(&self) -> Result<Vec<FriendRequest>, ApiError> {
        let url = self.endpoint(&["friends", "requests"])?;
        let resp = self.send(self.authorized(self.http.get(url))?).await?;
        let body: PendingRequestsResponse = Self::read_json(resp).await?;
        Ok(body
            .pending_requests
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect())
    }

    async fn fetch_sent_request_targets(&self) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint(&["friends", "sent-requests"])?;
        let resp = self.send(self.authorized(self.http.get(url))?).await?;
        let body: SentRequestsResponse = Self::read_json(resp).await?;
        Ok(body.target_ids())
    }

    async fn send_request(&self, to_user_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["friends", "request"])?;
        let body = serde_json::json!({ "toUserId": to_user_id });
        self.send(self.authorized(self.http.post(url))?.json(&body))
            .await?;
        Ok(())
    }

    async fn accept_request(&self, request_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["friends", "accept", request_id])?;
        self.send(self.authorized(self.http.patch(url))?).await?;
        Ok(())
    }

    async fn reject_request(&self, request_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["friends", "reject", request_id])?;
        self.send(self.authorized(self.http.delete(url))?).await?;
        Ok(())
    }

    async fn remove_friend(&self, friend_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["friends", friend_id])?;
        self.send(self.authorized(self.http.delete(url))?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_and_encodes() {
        let client = ApiClient::new("http://localhost:5000", None).unwrap();
        assert_eq!(
            client.endpoint(&["user", "my-animes", "A 1/x"]).unwrap().as_str(),
            "http://localhost:5000/api/user/my-animes/A%201%2Fx"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = ApiClient::new("https://example.com/tracker", None).unwrap();
        assert_eq!(
            client.endpoint(&["animes"]).unwrap().as_str(),
            "https://example.com/tracker/api/animes"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        assert!(matches!(
            ApiClient::new("mailto:someone@example.com", None),
            Err(ApiError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticated_calls_need_credential() {
        let client = ApiClient::new("http://localhost:5000", None).unwrap();
        let err = client.delete_entry("A1").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[test]
    fn test_with_credential_swaps_only_the_credential() {
        let anonymous = ApiClient::new("http://localhost:5000/shiori", None).unwrap();
        let authed = anonymous.with_credential(Some(Credential::new("tok-123")));

        assert!(anonymous.credential().is_none());
        assert_eq!(authed.credential().map(Credential::token), Some("tok-123"));
        assert_eq!(
            authed.endpoint(&["list"]).unwrap(),
            anonymous.endpoint(&["list"]).unwrap()
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let client =
            ApiClient::new("http://localhost:5000", Some(Credential::new("tok-123"))).unwrap();
        assert!(!format!("{client:?}").contains("tok-123"));
    }
}
