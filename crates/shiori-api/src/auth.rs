use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use shiori_core::session::{Credential, Session};

use super::client::ApiClient;
use super::error::ApiError;
use super::types::TokenResponse;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"));

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Check login input before anything goes over the wire.
pub fn validate_login(email: &str, password: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::Invalid("please fill in all fields".into()));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ApiError::Invalid("please enter a valid email address".into()));
    }
    Ok(())
}

pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), ApiError> {
    if username.trim().is_empty() {
        return Err(ApiError::Invalid("please fill in all fields".into()));
    }
    validate_login(email, password)?;
    if password != confirm {
        return Err(ApiError::Invalid("passwords do not match".into()));
    }
    Ok(())
}

impl ApiClient {
    /// Exchange email and password for a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        validate_login(email, password)?;
        let url = self.endpoint(&["auth", "login"])?;
        let session = self
            .post_credentials(url, &LoginRequest { email, password })
            .await?;
        tracing::info!("logged in");
        Ok(session)
    }

    /// Create an account; the backend logs the new user in right away.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<Session, ApiError> {
        validate_registration(username, email, password, confirm)?;
        let url = self.endpoint(&["auth", "register"])?;
        let session = self
            .post_credentials(
                url,
                &RegisterRequest {
                    username,
                    email,
                    password,
                },
            )
            .await?;
        tracing::info!(username, "registered");
        Ok(session)
    }

    async fn post_credentials<B: Serialize>(
        &self,
        url: url::Url,
        body: &B,
    ) -> Result<Session, ApiError> {
        let resp = self.http.post(url).json(body).send().await?;
        let resp = Self::check_response(resp).await?;
        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        let user_id = token.user_id();
        Ok(Session {
            token: Credential::new(token.token),
            user_id,
        })
    }
}
