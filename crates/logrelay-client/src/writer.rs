use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::io::AsyncRead;
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::retry::{is_retryable_error, is_retryable_status, RetryPolicy};
use crate::source::ReadOnlySource;

/// Stream `source` to a channel's write URL, retrying transient failures.
///
/// Every attempt continues from wherever the source currently stands; bytes
/// already sent by a failed attempt are not resent. Returns the number of
/// attempts made.
pub async fn write_with_retry<R>(
    client: &Client,
    url: &str,
    source: &ReadOnlySource<R>,
    policy: &RetryPolicy,
) -> Result<u32>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut attempt = 0;
    loop {
        debug!(url, attempt, "sending write request");
        let err = match client
            .post(url)
            .header(CONTENT_TYPE, "text/plain")
            .body(source.body())
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                info!(url, status = %response.status(), "write completed");
                return Ok(attempt + 1);
            }
            Ok(response) if is_retryable_status(response.status()) => {
                ClientError::UnexpectedStatus(response.status())
            }
            Ok(response) => return Err(ClientError::UnexpectedStatus(response.status())),
            Err(err) if is_retryable_error(&err) => ClientError::Request(err),
            Err(err) => return Err(err.into()),
        };
        policy.backoff(attempt, url, err).await?;
        attempt += 1;
    }
}
