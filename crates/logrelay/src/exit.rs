use std::fmt;
use std::io;

use logrelay_client::ClientError;
use logrelay_server::ServerError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
/// Another reader already owns the channel.
pub const CONFLICT: i32 = 9;
pub const PERMISSION_DENIED: i32 = 50;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(io_code(&err), format!("{context}: {err}"))
}

fn io_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut => TIMEOUT,
        io::ErrorKind::AddrInUse
        | io::ErrorKind::AddrNotAvailable
        | io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    }
}

pub fn server_error(context: &str, err: ServerError) -> CliError {
    match err {
        ServerError::Bind { source, .. } | ServerError::Io(source) => io_error(context, source),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    CliError::new(client_code(&err), format!("{context}: {err}"))
}

fn client_code(err: &ClientError) -> i32 {
    match err {
        ClientError::Request(err) if err.is_timeout() => TIMEOUT,
        ClientError::Request(err) if err.is_builder() => USAGE,
        ClientError::Request(_) => TRANSPORT_ERROR,
        ClientError::Io(err) => io_code(err),
        ClientError::ReaderConflict(_) => CONFLICT,
        ClientError::UnexpectedStatus(_) => FAILURE,
        ClientError::RetriesExhausted { last, .. } => client_code(last),
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn reader_conflict_maps_to_conflict() {
        let err = client_error(
            "read failed",
            ClientError::ReaderConflict("only one reader connection supported per channel".into()),
        );
        assert_eq!(err.code, CONFLICT);
        assert!(err.message.starts_with("read failed: "));
    }

    #[test]
    fn exhausted_retries_take_the_code_of_the_last_failure() {
        let err = client_error(
            "write failed",
            ClientError::RetriesExhausted {
                attempts: 13,
                last: Box::new(ClientError::UnexpectedStatus(StatusCode::BAD_GATEWAY)),
            },
        );
        assert_eq!(err.code, FAILURE);
        assert!(err.message.contains("13 attempts"));
    }

    #[test]
    fn bind_failure_maps_io_kind() {
        let err = server_error(
            "server failed",
            ServerError::Bind {
                address: "127.0.0.1:80".parse().unwrap(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            },
        );
        assert_eq!(err.code, PERMISSION_DENIED);
    }
}
