use thiserror::Error;

/// Errors from the backend API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),

    /// A bearer-authenticated call was attempted without a credential.
    #[error("not logged in")]
    Unauthenticated,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid input: {0}")]
    Invalid(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        Self::Invalid(format!("bad URL: {e}"))
    }
}
