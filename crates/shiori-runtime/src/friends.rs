use std::collections::HashSet;

use tokio::sync::RwLock;

use shiori_api::traits::FriendsBackend;
use shiori_api::types::{FriendRequest, UserSummary};
use shiori_core::event_log::{record, Mutation, SharedEventLog, StoreEvent};

use crate::error::StoreError;

/// Friends, incoming requests and outgoing request targets of the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FriendsState {
    pub friends: Vec<UserSummary>,
    pub requests: Vec<FriendRequest>,
    /// Ids of users the caller already sent a request to.
    pub sent: Vec<String>,
}

pub struct FriendsStore<B> {
    backend: B,
    state: RwLock<FriendsState>,
    events: SharedEventLog,
}

impl<B: FriendsBackend> FriendsStore<B> {
    pub fn new(backend: B, events: SharedEventLog) -> Self {
        Self {
            backend,
            state: RwLock::new(FriendsState::default()),
            events,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn state(&self) -> FriendsState {
        self.state.read().await.clone()
    }

    /// Fetch all three collections at once. On failure the previous state is
    /// kept.
    pub async fn load(&self) -> Result<FriendsState, StoreError> {
        let (friends, requests, sent) = tokio::join!(
            self.backend.fetch_friends(),
            self.backend.fetch_pending_requests(),
            self.backend.fetch_sent_request_targets(),
        );

        let loaded = match (friends, requests, sent) {
            (Ok(friends), Ok(requests), Ok(sent)) => FriendsState {
                friends,
                requests,
                sent,
            },
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                let err = StoreError::from(e);
                tracing::warn!(error = %err, "friends load failed");
                record(
                    &self.events,
                    StoreEvent::LoadFailed {
                        source: "friends".into(),
                        message: err.to_string(),
                    },
                );
                return Err(err);
            }
        };

        tracing::debug!(
            friends = loaded.friends.len(),
            requests = loaded.requests.len(),
            "friends loaded"
        );
        *self.state.write().await = loaded.clone();
        Ok(loaded)
    }

    pub async fn send_request(&self, user_id: &str) -> Result<(), StoreError> {
        let mutation = Mutation::SendFriendRequest;
        self.remote(mutation, user_id, self.backend.send_request(user_id))
            .await?;
        let mut state = self.state.write().await;
        if !state.sent.iter().any(|id| id == user_id) {
            state.sent.push(user_id.to_string());
        }
        Ok(())
    }

    /// Accept an incoming request, then refresh friends and requests.
    pub async fn accept(&self, request_id: &str) -> Result<FriendsState, StoreError> {
        let mutation = Mutation::AcceptFriendRequest;
        self.remote(mutation, request_id, self.backend.accept_request(request_id))
            .await?;
        self.state
            .write()
            .await
            .requests
            .retain(|r| r.id != request_id);
        self.load().await
    }

    /// Decline an incoming request, then refresh requests.
    pub async fn reject(&self, request_id: &str) -> Result<FriendsState, StoreError> {
        let mutation = Mutation::RejectFriendRequest;
        self.remote(mutation, request_id, self.backend.reject_request(request_id))
            .await?;
        let requests = self.backend.fetch_pending_requests().await;
        let mut state = self.state.write().await;
        match requests {
            Ok(requests) => state.requests = requests,
            Err(e) => {
                tracing::warn!(error = %e, "refreshing friend requests failed");
                state.requests.retain(|r| r.id != request_id);
            }
        }
        Ok(state.clone())
    }

    pub async fn remove_friend(&self, friend_id: &str) -> Result<(), StoreError> {
        let mutation = Mutation::RemoveFriend;
        self.remote(mutation, friend_id, self.backend.remove_friend(friend_id))
            .await?;
        self.state
            .write()
            .await
            .friends
            .retain(|f| f.id != friend_id);
        Ok(())
    }

    /// Search results the caller can still send a request to.
    pub async fn candidates(
        &self,
        users: Vec<UserSummary>,
        self_id: Option<&str>,
    ) -> Vec<UserSummary> {
        let state = self.state.read().await;
        filter_candidates(users, &state.friends, &state.sent, self_id)
    }

    async fn remote(
        &self,
        mutation: Mutation,
        target: &str,
        call: impl std::future::Future<Output = Result<(), shiori_api::ApiError>>,
    ) -> Result<(), StoreError> {
        match call.await {
            Ok(()) => {
                tracing::debug!(%mutation, target, "mutation applied");
                record(
                    &self.events,
                    StoreEvent::MutationApplied {
                        mutation,
                        target: target.to_string(),
                    },
                );
                Ok(())
            }
            Err(e) => {
                let err = StoreError::from(e);
                tracing::warn!(%mutation, target, error = %err, "mutation failed");
                record(
                    &self.events,
                    StoreEvent::MutationFailed {
                        mutation,
                        target: target.to_string(),
                        message: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    }
}

/// Drop users who are already friends, already asked, or the caller.
pub fn filter_candidates(
    users: Vec<UserSummary>,
    friends: &[UserSummary],
    sent: &[String],
    self_id: Option<&str>,
) -> Vec<UserSummary> {
    let excluded: HashSet<&str> = friends
        .iter()
        .map(|f| f.id.as_str())
        .chain(sent.iter().map(String::as_str))
        .chain(self_id)
        .collect();
    users
        .into_iter()
        .filter(|u| !excluded.contains(u.id.as_str()))
        .collect()
}
