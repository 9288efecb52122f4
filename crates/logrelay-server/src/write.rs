use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, RawQuery, State};
use axum::http::{Extensions, HeaderMap, StatusCode};
use futures_util::StreamExt;
use logrelay_channel::{validate_channel_name, ChannelBuffer};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::RelayError;
use crate::server::{client_address, RelayState};
use crate::session::WriterSession;

/// `POST /log/{channel}` - append the request body to the channel.
///
/// The raw query string, when non-empty, tags the session. Responds 200 once
/// the body ends, however it ends.
pub async fn write_channel(
    State(state): State<Arc<RelayState>>,
    Path(channel): Path<String>,
    RawQuery(query): RawQuery,
    extensions: Extensions,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, RelayError> {
    let peer = client_address(&extensions, &headers);
    validate_channel_name(&channel)?;

    let tag = query.filter(|tag| !tag.is_empty());
    let session = WriterSession::open(&state.registry, &channel, tag);
    info!(channel = %channel, peer = %peer, tag = ?session.tag(), "channel writer connected");

    let copied = copy_body(
        body,
        session.buffer(),
        state.config.effective_chunk_size(),
        &state.shutdown,
    )
    .await;
    drop(session);

    info!(channel = %channel, peer = %peer, bytes = copied, "channel writer disconnected");
    Ok(StatusCode::OK)
}

/// Copy `body` into `buffer`, at most `chunk_size` bytes per append.
///
/// Returns the number of bytes copied. Stops at end of body, on a body error,
/// or when the server shuts down.
pub(crate) async fn copy_body(
    body: Body,
    buffer: &ChannelBuffer,
    chunk_size: usize,
    shutdown: &CancellationToken,
) -> u64 {
    let mut stream = body.into_data_stream();
    let mut copied = 0u64;

    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = stream.next() => frame,
        };
        match frame {
            Some(Ok(data)) => {
                for chunk in data.chunks(chunk_size) {
                    buffer.append(chunk);
                    copied += chunk.len() as u64;
                }
            }
            Some(Err(err)) => {
                debug!(error = %err, "writer body ended with error");
                break;
            }
            None => break,
        }
    }

    copied
}
