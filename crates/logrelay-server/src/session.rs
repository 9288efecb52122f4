//! RAII occupancy guards for writer and reader sessions.
//!
//! hyper drops a handler future or a response body as soon as the client
//! goes away, so session end bookkeeping lives in `Drop` rather than at the
//! end of a handler.

use std::sync::Arc;

use bytes::Bytes;
use logrelay_channel::{ChannelBuffer, ChannelRegistry};
use tracing::info;

use crate::error::RelayError;

/// Delimiter line written around a tagged writer session.
pub fn tag_line(tag: &str) -> String {
    format!("===={tag}====\n")
}

/// An open writer session on a channel.
///
/// Dropping the session appends the closing tag line (if tagged) and ends the
/// writer session, which may finalize the channel.
#[derive(Debug)]
pub struct WriterSession {
    buffer: Arc<ChannelBuffer>,
    tag: Option<String>,
}

impl WriterSession {
    /// Check out `channel` for writing (creating it if needed) and open a session.
    pub fn open(registry: &ChannelRegistry, channel: &str, tag: Option<String>) -> Self {
        let buffer = registry.open_writer(channel);
        if let Some(tag) = &tag {
            buffer.append(tag_line(tag).as_bytes());
        }
        Self { buffer, tag }
    }

    pub fn buffer(&self) -> &ChannelBuffer {
        &self.buffer
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}

impl Drop for WriterSession {
    fn drop(&mut self) {
        if let Some(tag) = &self.tag {
            self.buffer.append(tag_line(tag).as_bytes());
        }
        self.buffer.writer_end();
    }
}

/// The single admitted reader of a channel.
///
/// Dropping an unfinished session releases the reader slot. A session that
/// finished by draining a finalized channel has already removed it from the
/// registry and releases nothing.
#[derive(Debug)]
pub struct ReaderSession {
    registry: Arc<ChannelRegistry>,
    buffer: Arc<ChannelBuffer>,
    channel: String,
    peer: String,
    finished: bool,
}

impl ReaderSession {
    /// Admit a reader for `channel`.
    ///
    /// Fails with [`RelayError::NotFound`] if the channel does not exist and
    /// [`RelayError::ReaderConflict`] if another reader is attached.
    pub fn admit(
        registry: Arc<ChannelRegistry>,
        channel: &str,
        peer: impl Into<String>,
    ) -> Result<Self, RelayError> {
        let buffer = registry.checkout_for_read(channel)?;
        if !buffer.try_reader_start() {
            return Err(RelayError::ReaderConflict(channel.to_string()));
        }
        Ok(Self {
            registry,
            buffer,
            channel: channel.to_string(),
            peer: peer.into(),
            finished: false,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Take everything currently queued.
    pub fn drain(&self) -> Bytes {
        self.buffer.drain(self.buffer.len())
    }

    /// End the session if the channel is finalized and fully drained.
    ///
    /// Evicts the channel when it is still registered under this buffer.
    /// A buffer the sweep already removed ends the session once drained.
    /// Returns true if the session is now finished.
    pub fn finish_if_drained(&mut self) -> bool {
        if self.finished {
            return true;
        }
        let evicted = self.registry.evict_if_drained(&self.channel, &self.buffer);
        let orphaned =
            !evicted && !self.registry.holds(&self.channel, &self.buffer) && self.buffer.is_drained();
        if evicted || orphaned {
            self.finished = true;
            info!(channel = %self.channel, peer = %self.peer, "channel finalized");
        }
        self.finished
    }
}

impl Drop for ReaderSession {
    fn drop(&mut self) {
        if !self.finished {
            self.buffer.reader_end();
            let stats = self.buffer.stats();
            info!(
                channel = %self.channel,
                peer = %self.peer,
                queued = stats.queued,
                writers = stats.writers,
                "channel reader disconnected"
            );
        }
    }
}
