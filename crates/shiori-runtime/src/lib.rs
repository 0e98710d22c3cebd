//! Stateful stores on top of the backend API.
//!
//! [`WatchListStore`] keeps one user's normalized anime list and reconciles
//! local state with every mutation; [`FriendsStore`] does the same for the
//! friend list and friend requests.

pub mod error;
pub mod friends;
pub mod watchlist;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ErrorKind, StoreError};
pub use friends::{FriendsState, FriendsStore};
pub use watchlist::WatchListStore;
