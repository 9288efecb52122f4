//! Read-only, shareable view of an input stream.
//!
//! A request body owns its stream and drops it when the request fails. Handing
//! the body a [`ReadOnlySource`] clone instead of the input itself leaves the
//! input open for the next attempt.

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::io::ReaderStream;

/// Cloneable handle over a shared reader that exposes reads and nothing else.
#[derive(Debug)]
pub struct ReadOnlySource<R> {
    inner: Arc<Mutex<R>>,
}

impl<R> Clone for ReadOnlySource<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> ReadOnlySource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            inner: Arc::new(Mutex::new(reader)),
        }
    }

    /// A fresh streaming request body reading from the shared source.
    pub fn body(&self) -> reqwest::Body {
        reqwest::Body::wrap_stream(ReaderStream::new(self.clone()))
    }
}

impl<R> AsyncRead for ReadOnlySource<R>
where
    R: AsyncRead + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let mut reader = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Pin::new(&mut *reader).poll_read(cx, buf)
    }
}
