//! Bounded in-memory byte conduit joining two pipeline stages
//!
//! The writer half is an `AsyncWrite`, the reader half an `AsyncRead`. A full
//! conduit suspends the writer; an empty one suspends the reader. Dropping
//! either half wakes the other:
//! - reader dropped: every further write fails with `BrokenPipe`
//! - writer shut down, then dropped: the reader drains what is queued and
//!   sees end of stream
//! - writer dropped without shutdown: the reader drains what is queued and
//!   then fails with `UnexpectedEof`, so a truncated stream can never pass
//!   as a complete one

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::mpsc;
use tokio_util::sync::PollSender;

/// Upper bound on the bytes carried by one queued chunk
pub const CONDUIT_CHUNK_SIZE: usize = 64 * 1024;

/// Create a conduit holding at most `capacity` chunks in flight.
pub fn conduit(capacity: usize) -> (ConduitWriter, ConduitReader) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let finished = Arc::new(AtomicBool::new(false));
    (
        ConduitWriter {
            tx: PollSender::new(tx),
            finished: finished.clone(),
        },
        ConduitReader {
            rx,
            chunk: Bytes::new(),
            finished,
        },
    )
}

pub struct ConduitWriter {
    tx: PollSender<Bytes>,
    finished: Arc<AtomicBool>,
}

fn broken_pipe() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "conduit reader closed")
}

impl AsyncWrite for ConduitWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }
        ready!(this.tx.poll_reserve(cx)).map_err(|_| broken_pipe())?;
        let n = buf.len().min(CONDUIT_CHUNK_SIZE);
        this.tx
            .send_item(Bytes::copy_from_slice(&buf[..n]))
            .map_err(|_| broken_pipe())?;
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        // Must be visible before the channel reports closed
        this.finished.store(true, Ordering::Release);
        this.tx.close();
        Poll::Ready(Ok(()))
    }
}

pub struct ConduitReader {
    rx: mpsc::Receiver<Bytes>,
    chunk: Bytes,
    finished: Arc<AtomicBool>,
}

impl AsyncRead for ConduitReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            if !this.chunk.is_empty() {
                let n = this.chunk.len().min(buf.remaining());
                buf.put_slice(&this.chunk.split_to(n));
                return Poll::Ready(Ok(()));
            }
            match ready!(this.rx.poll_recv(cx)) {
                Some(chunk) => this.chunk = chunk,
                None if this.finished.load(Ordering::Acquire) => return Poll::Ready(Ok(())),
                None => {
                    return Poll::Ready(Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "conduit writer closed before finishing",
                    )))
                }
            }
        }
    }
}
