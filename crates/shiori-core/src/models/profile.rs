use serde::{Deserialize, Serialize};

/// Avatar used when a user never picked one.
pub const PLACEHOLDER_AVATAR: &str = "/assets/profile-pictures/placeholder.png";

/// Whose list or profile is being looked at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Subject {
    /// The authenticated caller.
    #[default]
    Me,
    /// Another user, e.g. a friend.
    User(String),
}

impl Subject {
    pub fn is_me(&self) -> bool {
        matches!(self, Self::Me)
    }
}

/// Public profile data of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Option<String>,
    pub username: String,
    pub email: String,
    pub avatar: String,
}
