use shiori_api::ApiError;
use thiserror::Error;

/// Coarse failure classes a caller needs to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never reached the server.
    NetworkUnavailable,
    /// The server (or the client on its behalf) refused the request.
    RemoteRejected,
    /// Data was missing or not in the expected shape.
    DataShapeUnexpected,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("rejected by backend (status {status}): {message}")]
    RemoteRejected { status: u16, message: String },

    #[error("anime {anime_id} is already in the list")]
    AlreadyInList { anime_id: String },

    #[error("not logged in")]
    NotAuthenticated,

    /// Only the caller's own list accepts mutations.
    #[error("another user's list is read-only")]
    ReadOnly,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected data: {0}")]
    DataShapeUnexpected(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkUnavailable(_) => ErrorKind::NetworkUnavailable,
            Self::RemoteRejected { .. }
            | Self::AlreadyInList { .. }
            | Self::NotAuthenticated
            | Self::ReadOnly => ErrorKind::RemoteRejected,
            Self::InvalidRequest(_) | Self::DataShapeUnexpected(_) => {
                ErrorKind::DataShapeUnexpected
            }
        }
    }
}

impl From<ApiError> for StoreError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Network(msg) => Self::NetworkUnavailable(msg),
            ApiError::Unauthenticated => Self::NotAuthenticated,
            ApiError::Api { status, message } => Self::RemoteRejected { status, message },
            ApiError::Parse(msg) => Self::DataShapeUnexpected(msg),
            ApiError::Invalid(msg) => Self::InvalidRequest(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_map_to_kinds() {
        let cases = [
            (ApiError::Network("refused".into()), ErrorKind::NetworkUnavailable),
            (ApiError::Unauthenticated, ErrorKind::RemoteRejected),
            (
                ApiError::Api {
                    status: 404,
                    message: "not found".into(),
                },
                ErrorKind::RemoteRejected,
            ),
            (ApiError::Parse("eof".into()), ErrorKind::DataShapeUnexpected),
        ];
        for (api, kind) in cases {
            assert_eq!(StoreError::from(api).kind(), kind);
        }
    }

    #[test]
    fn test_already_in_list_is_a_rejection() {
        let err = StoreError::AlreadyInList {
            anime_id: "A1".into(),
        };
        assert_eq!(err.kind(), ErrorKind::RemoteRejected);
        assert_eq!(err.to_string(), "anime A1 is already in the list");
    }
}
