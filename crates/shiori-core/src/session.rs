//! Persisted login session.
//!
//! The bearer token is produced by the auth endpoints and only ever read by the
//! rest of the crate: it is handed to the API client as a [`Credential`] at
//! construction time.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: Credential,
    pub user_id: Option<String>,
}

impl Session {
    pub fn new(token: Credential) -> Self {
        Self {
            token,
            user_id: None,
        }
    }

    /// Read a saved session. `Ok(None)` when nobody is logged in.
    pub fn load(path: &Path) -> Result<Option<Self>, CoreError> {
        if !path.exists() {
            return Ok(None);
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| CoreError::Session(e.to_string()))?;
        let session = toml::from_str(&content).map_err(|e| CoreError::Session(e.to_string()))?;
        Ok(Some(session))
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CoreError::Session(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Forget the saved session. Missing file is not an error.
    pub fn clear(path: &Path) -> Result<(), CoreError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
