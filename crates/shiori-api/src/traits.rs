//! Backend interfaces consumed by the stores.
//!
//! [`ApiClient`](crate::ApiClient) implements all of them against the REST
//! service; tests implement them in memory.

use std::future::Future;

use shiori_core::models::{AnimeRef, Subject};

use crate::error::ApiError;
use crate::types::{EntryAck, EntryUpdate, FriendRequest, RawList, UserSummary};

/// Watch-list endpoints plus the catalog lookup needed to populate entries.
pub trait ListBackend: Send + Sync {
    /// Raw entries of a user's list, in backend order.
    fn fetch_entries(
        &self,
        subject: &Subject,
    ) -> impl Future<Output = Result<RawList, ApiError>> + Send;

    /// Full catalog record for one anime. Fails with `Parse` when the record
    /// has no title.
    fn fetch_anime(&self, anime_id: &str)
        -> impl Future<Output = Result<AnimeRef, ApiError>> + Send;

    /// Add an anime to the caller's list.
    fn add_entry(&self, anime_id: &str) -> impl Future<Output = Result<EntryAck, ApiError>> + Send;

    /// Patch fields of an entry in the caller's list.
    fn update_entry(
        &self,
        anime_id: &str,
        update: &EntryUpdate,
    ) -> impl Future<Output = Result<EntryAck, ApiError>> + Send;

    /// Flip the favorite flag server-side.
    fn toggle_favorite(
        &self,
        anime_id: &str,
    ) -> impl Future<Output = Result<EntryAck, ApiError>> + Send;

    /// Hard-delete an entry from the caller's list.
    fn delete_entry(&self, anime_id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Friend list and friend request endpoints.
pub trait FriendsBackend: Send + Sync {
    fn fetch_friends(&self) -> impl Future<Output = Result<Vec<UserSummary>, ApiError>> + Send;

    /// Requests other users sent to the caller.
    fn fetch_pending_requests(
        &self,
    ) -> impl Future<Output = Result<Vec<FriendRequest>, ApiError>> + Send;

    /// Ids of users the caller already sent a request to.
    fn fetch_sent_request_targets(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    fn send_request(&self, to_user_id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn accept_request(&self, request_id: &str)
        -> impl Future<Output = Result<(), ApiError>> + Send;

    fn reject_request(&self, request_id: &str)
        -> impl Future<Output = Result<(), ApiError>> + Send;

    fn remove_friend(&self, friend_id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;
}
