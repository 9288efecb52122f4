use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Another reader owns the channel. Carries the server's message.
    #[error("reader conflict: {0}")]
    ReaderConflict(String),

    #[error("unexpected response status {0}")]
    UnexpectedStatus(StatusCode),

    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ClientError>,
    },
}

pub type Result<T> = std::result::Result<T, ClientError>;
