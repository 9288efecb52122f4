/// Errors that can occur when looking up or naming channels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// No channel is registered under the name.
    #[error("channel does not exist: {0}")]
    NotFound(String),

    /// The name is empty or contains characters outside `[A-Za-z0-9_]`.
    #[error("invalid channel name: {0:?}")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
