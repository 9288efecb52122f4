use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Extensions, HeaderMap};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::Stream;
use logrelay_channel::is_valid_channel_name;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::RelayError;
use crate::server::{client_address, RelayState};
use crate::session::ReaderSession;

/// `GET /log/{channel}` - stream the channel to the client as data arrives.
pub async fn read_channel(
    State(state): State<Arc<RelayState>>,
    Path(channel): Path<String>,
    extensions: Extensions,
    headers: HeaderMap,
) -> Result<Response, RelayError> {
    let peer = client_address(&extensions, &headers);
    if !is_valid_channel_name(&channel) {
        info!(channel = %channel, peer = %peer, "channel not found");
        return Err(RelayError::NotFound(channel));
    }

    let session = match ReaderSession::admit(Arc::clone(&state.registry), &channel, peer.clone()) {
        Ok(session) => session,
        Err(err) => {
            match &err {
                RelayError::NotFound(_) => {
                    info!(channel = %channel, peer = %peer, "channel not found")
                }
                RelayError::ReaderConflict(_) => {
                    info!(channel = %channel, peer = %peer, "channel has too many readers")
                }
            }
            return Err(err);
        }
    };
    info!(channel = %channel, peer = %peer, "channel reader connected");

    let stream = drain_stream(session, state.config.poll_interval, state.shutdown.clone());
    Ok((
        [(header::CONTENT_TYPE, "text/plain")],
        Body::from_stream(stream),
    )
        .into_response())
}

/// Turn an admitted reader session into a body stream.
///
/// Every non-empty drain becomes its own chunk, which hyper writes out
/// immediately. When nothing is queued the stream either finishes (channel
/// finalized and drained) or waits `poll_interval` and drains again. Server
/// shutdown ends the stream and releases the reader slot.
pub fn drain_stream(
    session: ReaderSession,
    poll_interval: Duration,
    shutdown: CancellationToken,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    futures_util::stream::unfold(session, move |mut session| {
        let shutdown = shutdown.clone();
        async move {
            loop {
                let chunk = session.drain();
                if !chunk.is_empty() {
                    return Some((Ok(chunk), session));
                }
                if session.finish_if_drained() {
                    return None;
                }
                tokio::select! {
                    _ = shutdown.cancelled() => return None,
                    _ = tokio::time::sleep(poll_interval) => {}
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use logrelay_channel::ChannelRegistry;

    use super::*;
    use crate::session::WriterSession;

    #[tokio::test(start_paused = true)]
    async fn stream_yields_across_writer_reconnect_then_ends() {
        let registry = Arc::new(ChannelRegistry::default());
        let first = WriterSession::open(&registry, "printer", None);
        let session = ReaderSession::admit(Arc::clone(&registry), "printer", "test").unwrap();
        let mut stream = Box::pin(drain_stream(
            session,
            Duration::from_millis(10),
            CancellationToken::new(),
        ));

        first.buffer().append(b"A");
        drop(first);
        assert_eq!(stream.next().await.unwrap().unwrap().as_ref(), b"A");

        let second = WriterSession::open(&registry, "printer", None);
        second.buffer().append(b"B");
        drop(second);
        let finalized_at = tokio::time::Instant::now();
        assert_eq!(stream.next().await.unwrap().unwrap().as_ref(), b"B");

        // The reader is still attached, so the channel lingers for the grace window.
        assert!(registry.contains("printer"));
        assert!(stream.next().await.is_none());
        assert!(!registry.contains("printer"));
        assert!(finalized_at.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_ends_stream_and_releases_reader() {
        let registry = Arc::new(ChannelRegistry::default());
        let writer = WriterSession::open(&registry, "printer", None);
        let session = ReaderSession::admit(Arc::clone(&registry), "printer", "test").unwrap();
        let shutdown = CancellationToken::new();
        let mut stream = Box::pin(drain_stream(
            session,
            Duration::from_millis(10),
            shutdown.clone(),
        ));

        shutdown.cancel();
        assert!(stream.next().await.is_none());
        drop(stream);
        assert_eq!(writer.buffer().reader_count(), 0);
    }
}
