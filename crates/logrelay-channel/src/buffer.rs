use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::time::Instant;
use tracing::warn;

/// Default window during which a reconnecting writer can revive a channel
/// that still has a reader attached.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// A FIFO byte queue with writer/reader occupancy and finalize state.
///
/// Every operation takes the buffer's own lock for its duration only; the
/// lock is never held across I/O. Reader exclusivity is not enforced here
/// except through [`ChannelBuffer::try_reader_start`], which the read
/// endpoint uses as its admission check.
#[derive(Debug)]
pub struct ChannelBuffer {
    grace: Duration,
    state: Mutex<BufferState>,
}

#[derive(Debug)]
struct BufferState {
    queue: BytesMut,
    writers: usize,
    readers: usize,
    finalized: bool,
    expiry: Option<Instant>,
}

/// Point-in-time view of a buffer's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    /// Bytes waiting to be drained.
    pub queued: usize,
    /// Open writer sessions.
    pub writers: usize,
    /// Open reader sessions.
    pub readers: usize,
    /// True once the last writer session has ended.
    pub finalized: bool,
    /// End of the grace window, if one is pending.
    pub expiry: Option<Instant>,
}

impl Default for ChannelBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelBuffer {
    /// Create an empty buffer with the default grace window.
    pub fn new() -> Self {
        Self::with_grace(DEFAULT_GRACE)
    }

    /// Create an empty buffer with an explicit grace window.
    pub fn with_grace(grace: Duration) -> Self {
        Self {
            grace,
            state: Mutex::new(BufferState {
                queue: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
                writers: 0,
                readers: 0,
                finalized: false,
                expiry: None,
            }),
        }
    }

    /// Grace window applied when the last writer leaves while a reader is attached.
    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Append bytes to the tail of the queue.
    pub fn append(&self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.lock().queue.extend_from_slice(data);
    }

    /// Remove and return up to `max` bytes from the head of the queue.
    ///
    /// Returns an empty `Bytes` when nothing is queued; never blocks.
    pub fn drain(&self, max: usize) -> Bytes {
        let mut state = self.lock();
        let n = max.min(state.queue.len());
        state.queue.split_to(n).freeze()
    }

    /// Open a writer session. Clears `finalized` and any pending expiry.
    pub fn writer_start(&self) {
        let mut state = self.lock();
        state.writers += 1;
        state.finalized = false;
        state.expiry = None;
    }

    /// Close a writer session.
    ///
    /// When the last writer leaves the buffer is finalized; if a reader is
    /// still attached, reclamation is deferred by the grace window. Returns
    /// true if this call finalized the buffer.
    pub fn writer_end(&self) -> bool {
        let mut state = self.lock();
        if state.writers == 0 {
            warn!("writer session end without matching start");
            return false;
        }
        state.writers -= 1;
        if state.writers > 0 {
            return false;
        }
        if state.readers > 0 {
            state.expiry = Some(Instant::now() + self.grace);
        }
        state.finalized = true;
        true
    }

    /// Open a reader session unconditionally.
    #[cfg(test)]
    pub(crate) fn reader_start(&self) {
        self.lock().readers += 1;
    }

    /// Open a reader session only if no other reader is attached.
    ///
    /// The check and the increment happen under one lock acquisition.
    pub fn try_reader_start(&self) -> bool {
        let mut state = self.lock();
        if state.readers > 0 {
            return false;
        }
        state.readers = 1;
        true
    }

    /// Close a reader session.
    pub fn reader_end(&self) {
        let mut state = self.lock();
        if state.readers == 0 {
            warn!("reader session end without matching start");
            return;
        }
        state.readers -= 1;
    }

    /// True if the buffer is finalized and any grace window has elapsed.
    ///
    /// Queue contents are not considered.
    pub fn is_reclaimable(&self) -> bool {
        self.is_reclaimable_at(Instant::now())
    }

    /// [`ChannelBuffer::is_reclaimable`] evaluated at `now`.
    pub fn is_reclaimable_at(&self, now: Instant) -> bool {
        self.lock().reclaimable_at(now)
    }

    /// True if the buffer is reclaimable and its queue is empty, checked atomically.
    pub fn is_drained(&self) -> bool {
        let state = self.lock();
        state.queue.is_empty() && state.reclaimable_at(Instant::now())
    }

    /// Bytes currently queued.
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn is_finalized(&self) -> bool {
        self.lock().finalized
    }

    pub fn writer_count(&self) -> usize {
        self.lock().writers
    }

    pub fn reader_count(&self) -> usize {
        self.lock().readers
    }

    /// Snapshot all counters under one lock acquisition.
    pub fn stats(&self) -> BufferStats {
        let state = self.lock();
        BufferStats {
            queued: state.queue.len(),
            writers: state.writers,
            readers: state.readers,
            finalized: state.finalized,
            expiry: state.expiry,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BufferState> {
        // State is plain data; a panic elsewhere cannot leave it half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BufferState {
    fn reclaimable_at(&self, now: Instant) -> bool {
        self.finalized && self.expiry.is_none_or(|expiry| expiry <= now)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn drain_returns_bytes_in_append_order() {
        let buffer = ChannelBuffer::new();
        buffer.append(b"hello ");
        buffer.append(b"world");

        assert_eq!(buffer.len(), 11);
        assert_eq!(buffer.drain(5).as_ref(), b"hello");
        assert_eq!(buffer.drain(100).as_ref(), b" world");
        assert!(buffer.is_empty());
    }

    #[test]
    fn drain_on_empty_queue_returns_nothing() {
        let buffer = ChannelBuffer::new();
        assert!(buffer.drain(64).is_empty());
        assert!(buffer.drain(0).is_empty());
    }

    #[test]
    fn fifo_preserved_with_concurrent_drainer() {
        let buffer = Arc::new(ChannelBuffer::new());
        let expected: Vec<u8> = (0..2000u32).flat_map(|i| i.to_le_bytes()).collect();

        let writer = {
            let buffer = Arc::clone(&buffer);
            let payload = expected.clone();
            thread::spawn(move || {
                for chunk in payload.chunks(7) {
                    buffer.append(chunk);
                }
            })
        };

        let mut observed = Vec::with_capacity(expected.len());
        while observed.len() < expected.len() {
            let chunk = buffer.drain(buffer.len());
            observed.extend_from_slice(&chunk);
            if chunk.is_empty() {
                thread::yield_now();
            }
        }
        writer.join().expect("writer thread should finish");

        assert_eq!(observed, expected);
    }

    #[test]
    fn last_writer_end_without_reader_finalizes_immediately() {
        let buffer = ChannelBuffer::new();
        buffer.writer_start();
        assert!(!buffer.is_reclaimable());

        assert!(buffer.writer_end());
        let stats = buffer.stats();
        assert!(stats.finalized);
        assert!(stats.expiry.is_none());
        assert!(buffer.is_reclaimable());
        assert!(buffer.is_drained());
    }

    #[test]
    fn overlapping_writers_finalize_only_after_last_leaves() {
        let buffer = ChannelBuffer::new();
        buffer.writer_start();
        buffer.writer_start();

        assert!(!buffer.writer_end());
        assert!(!buffer.is_finalized());
        assert!(buffer.writer_end());
        assert!(buffer.is_finalized());
    }

    #[test]
    fn writer_end_with_reader_attached_defers_reclamation() {
        let buffer = ChannelBuffer::with_grace(Duration::from_secs(5));
        buffer.writer_start();
        assert!(buffer.try_reader_start());
        buffer.writer_end();

        let expiry = buffer.stats().expiry.expect("grace window should be set");
        assert!(buffer.is_finalized());
        assert!(!buffer.is_reclaimable_at(expiry - Duration::from_millis(1)));
        assert!(buffer.is_reclaimable_at(expiry));
    }

    #[test]
    fn writer_start_revives_a_finalized_buffer() {
        let buffer = ChannelBuffer::new();
        buffer.reader_start();
        buffer.writer_start();
        buffer.writer_end();
        assert!(buffer.stats().expiry.is_some());

        buffer.writer_start();
        let stats = buffer.stats();
        assert!(!stats.finalized);
        assert!(stats.expiry.is_none());
        assert!(!buffer.is_reclaimable_at(Instant::now() + Duration::from_secs(3600)));
    }

    #[test]
    fn try_reader_start_admits_only_one_reader() {
        let buffer = ChannelBuffer::new();
        assert!(buffer.try_reader_start());
        assert!(!buffer.try_reader_start());
        assert_eq!(buffer.reader_count(), 1);

        buffer.reader_end();
        assert!(buffer.try_reader_start());
    }

    #[test]
    fn unmatched_end_calls_saturate_at_zero() {
        let buffer = ChannelBuffer::new();
        assert!(!buffer.writer_end());
        buffer.reader_end();

        let stats = buffer.stats();
        assert_eq!((stats.writers, stats.readers), (0, 0));
        assert!(!stats.finalized);
    }

    #[test]
    fn drained_requires_empty_queue() {
        let buffer = ChannelBuffer::new();
        buffer.writer_start();
        buffer.append(b"pending");
        buffer.writer_end();

        assert!(buffer.is_reclaimable());
        assert!(!buffer.is_drained());
        buffer.drain(buffer.len());
        assert!(buffer.is_drained());
    }

    #[tokio::test(start_paused = true)]
    async fn grace_window_follows_the_runtime_clock() {
        let buffer = ChannelBuffer::with_grace(Duration::from_secs(5));
        buffer.writer_start();
        buffer.reader_start();
        buffer.writer_end();

        tokio::time::advance(Duration::from_millis(4_999)).await;
        assert!(!buffer.is_reclaimable());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(buffer.is_reclaimable());
    }
}
