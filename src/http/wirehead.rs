//! Request-head substitution under hyper.
//!
//! hyper's HTTP/1 encoder writes headers from an `http::HeaderMap`, which
//! groups repeated names together. [`OrderedHead`] sits between hyper and the
//! socket: it swallows the head hyper writes (everything up to and including
//! the first blank line) and sends the pre-rendered head in its place. Body
//! bytes and everything read back pass through untouched, so framing and
//! response parsing stay with hyper.

use bytes::{Buf, Bytes, BytesMut};
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

const HEAD_END: &[u8] = b"\r\n\r\n";

/// Stream wrapper that replaces the first request head written through it.
#[derive(Debug)]
pub struct OrderedHead<S> {
    inner: S,
    /// Replacement head; `None` once it has been swapped in.
    head: Option<Bytes>,
    /// Head bytes written by hyper so far, discarded on swap.
    swallowed: Vec<u8>,
    /// Bytes accepted from the caller that the socket has not taken yet.
    pending: Bytes,
}

impl<S> OrderedHead<S> {
    pub fn new(inner: S, head: Bytes) -> Self {
        Self {
            inner,
            head: Some(head),
            swallowed: Vec::new(),
            pending: Bytes::new(),
        }
    }
}

impl<S: AsyncWrite + Unpin> OrderedHead<S> {
    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while !self.pending.is_empty() {
            let n = ready!(Pin::new(&mut self.inner).poll_write(cx, &self.pending))?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.pending.advance(n);
        }
        Poll::Ready(Ok(()))
    }

    /// Buffer hyper's head; once it is complete, queue the replacement head
    /// followed by whatever came after the blank line.
    fn swallow(&mut self, buf: &[u8]) {
        let search_from = self.swallowed.len().saturating_sub(HEAD_END.len() - 1);
        self.swallowed.extend_from_slice(buf);

        let Some(pos) = self.swallowed[search_from..]
            .windows(HEAD_END.len())
            .position(|w| w == HEAD_END)
        else {
            return;
        };
        let end = search_from + pos + HEAD_END.len();

        if let Some(head) = self.head.take() {
            let rest = &self.swallowed[end..];
            let mut out = BytesMut::with_capacity(head.len() + rest.len());
            out.extend_from_slice(&head);
            out.extend_from_slice(rest);
            self.pending = out.freeze();
        }
        self.swallowed = Vec::new();
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for OrderedHead<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for OrderedHead<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;

        if this.head.is_some() {
            this.swallow(buf);
            // Start sending right away; the rest goes out on flush.
            if let Poll::Ready(Err(e)) = this.poll_drain(cx) {
                return Poll::Ready(Err(e));
            }
            return Poll::Ready(Ok(buf.len()));
        }
        Pin::new(&mut this.inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_shutdown(cx)
    }
}
