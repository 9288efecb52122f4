use std::net::SocketAddr;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use logrelay_channel::ChannelError;

/// Body of the 409 response sent to a second concurrent reader.
pub const READER_CONFLICT_MESSAGE: &str = "only one reader connection supported per channel";

/// Errors that end a relay request before any streaming starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// Channel name is malformed, or the channel does not exist.
    #[error("channel not found: {0}")]
    NotFound(String),

    /// Another reader already holds the channel.
    #[error("reader already attached to channel {0}")]
    ReaderConflict(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ReaderConflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl From<ChannelError> for RelayError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::NotFound(name) | ChannelError::InvalidName(name) => Self::NotFound(name),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND.into_response(),
            Self::ReaderConflict(_) => (
                StatusCode::CONFLICT,
                [(header::CONTENT_TYPE, "text/plain")],
                READER_CONFLICT_MESSAGE,
            )
                .into_response(),
        }
    }
}

/// Errors that stop the relay server itself.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the listen address.
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: SocketAddr,
        source: std::io::Error,
    },

    /// The bound listener could not report its address.
    #[error("listener I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP server loop failed.
    #[error("http server error: {0}")]
    Serve(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_errors_map_to_not_found() {
        let missing: RelayError = ChannelError::NotFound("a".to_string()).into();
        let invalid: RelayError = ChannelError::InvalidName("a-b".to_string()).into();

        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(invalid, RelayError::NotFound("a-b".to_string()));
    }

    #[test]
    fn conflict_response_carries_fixed_message() {
        let response = RelayError::ReaderConflict("printer".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain"
        );
    }
}
