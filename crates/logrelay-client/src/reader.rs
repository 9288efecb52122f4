use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::retry::{is_retryable_error, is_retryable_status, RetryPolicy};

/// How a read finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The server ended the stream: the channel was finalized and drained.
    Completed { bytes: u64 },
    /// The channel does not exist, or was already finalized and drained.
    ChannelNotFound,
}

/// Copy a channel's read URL into `sink` until the server ends the stream.
///
/// A 404 is terminal without error and a 409 is terminal with
/// [`ClientError::ReaderConflict`]. Transport errors, before or during the
/// stream, and gateway statuses are retried. A 404 after a retried stream that
/// already produced output means the channel finished in the meantime, and is
/// reported as completed.
pub async fn read_with_retry<W>(
    client: &Client,
    url: &str,
    sink: &mut W,
    policy: &RetryPolicy,
) -> Result<ReadOutcome>
where
    W: AsyncWrite + Unpin,
{
    let mut copied = 0u64;
    let mut attempt = 0;
    loop {
        debug!(url, attempt, "sending read request");
        let err = match client.get(url).send().await {
            Ok(response) => match response.status() {
                StatusCode::NOT_FOUND if copied > 0 => {
                    return Ok(ReadOutcome::Completed { bytes: copied })
                }
                StatusCode::NOT_FOUND => {
                    info!(url, "channel not found");
                    return Ok(ReadOutcome::ChannelNotFound);
                }
                StatusCode::CONFLICT => {
                    let message = response.text().await.unwrap_or_default();
                    return Err(ClientError::ReaderConflict(message.trim_end().to_string()));
                }
                status if is_retryable_status(status) => ClientError::UnexpectedStatus(status),
                status if !status.is_success() => {
                    return Err(ClientError::UnexpectedStatus(status))
                }
                _ => match copy_response(response, sink, &mut copied).await {
                    Ok(()) => {
                        info!(url, bytes = copied, "read completed");
                        return Ok(ReadOutcome::Completed { bytes: copied });
                    }
                    Err(ClientError::Request(err)) if is_retryable_error(&err) => {
                        ClientError::Request(err)
                    }
                    Err(err) => return Err(err),
                },
            },
            Err(err) if is_retryable_error(&err) => ClientError::Request(err),
            Err(err) => return Err(err.into()),
        };
        policy.backoff(attempt, url, err).await?;
        attempt += 1;
    }
}

/// Write each body chunk to `sink` and flush it, counting bytes into `copied`.
async fn copy_response<W>(
    response: reqwest::Response,
    sink: &mut W,
    copied: &mut u64,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        sink.write_all(&chunk).await?;
        sink.flush().await?;
        *copied += chunk.len() as u64;
    }
    Ok(())
}
