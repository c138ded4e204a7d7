//! Line reading over `tokio::io::AsyncRead`.
//!
//! Same buffer, matcher and lifecycle as the blocking [`LineReader`](crate::LineReader);
//! the refill is the only await point besides the per-line callback of
//! [`each_line_async`].

use crate::buffer::{Extract, LineBuffer};
use crate::config::ReaderConfig;
use crate::engine::StreamState;
use crate::error::{Error, Result};
use crate::iteration::Flow;
use crate::reader::Line;
use log::debug;
use std::future::Future;
use tokio::io::{AsyncRead, AsyncReadExt};

/// An async reader for streaming lines with one line of lookahead.
#[derive(Debug)]
pub struct AsyncLineReader<R> {
    // `None` once the stream has been released.
    inner: Option<R>,
    config: ReaderConfig,
    buffer: LineBuffer,
    chunk: Vec<u8>,
    state: StreamState,
    lookahead: Option<Result<String>>,
    delivered: u64,
}

impl<R: AsyncRead + Unpin> AsyncLineReader<R> {
    /// Wraps `reader` and reads ahead to the first line.
    pub async fn open(reader: R, config: ReaderConfig) -> Result<Self> {
        let mut this = Self::new(reader, config);
        this.start().await?;
        Ok(this)
    }

    fn new(reader: R, config: ReaderConfig) -> Self {
        Self {
            inner: Some(reader),
            buffer: LineBuffer::new(config.separator.clone(), config.encoding),
            chunk: Vec::new(),
            state: StreamState::Unopened,
            lookahead: None,
            delivered: 0,
            config,
        }
    }

    async fn start(&mut self) -> Result<()> {
        if let Err(e) = self.config.validate() {
            return Err(self.fail(e));
        }
        self.chunk = vec![0u8; self.config.buffer_size];
        self.state = StreamState::Open;
        self.read_ahead().await;
        Ok(())
    }

    pub fn has_next_line(&self) -> bool {
        self.lookahead.is_some()
    }

    /// Returns the next line. Errors as for [`LineReader::next_line`](crate::LineReader::next_line).
    pub async fn next_line(&mut self) -> Result<String> {
        match self.lookahead.take() {
            Some(Ok(line)) => {
                self.delivered += 1;
                self.read_ahead().await;
                Ok(line)
            }
            Some(Err(e)) => Err(e),
            None => Err(match self.state {
                StreamState::Eof => Error::Exhausted,
                _ => Error::Closed,
            }),
        }
    }

    pub async fn next_entry(&mut self) -> Result<Line> {
        let text = self.next_line().await?;
        Ok(Line {
            text,
            last: !self.has_next_line(),
        })
    }

    /// Drops the stream and any line read ahead. Idempotent.
    pub fn close(&mut self) {
        self.lookahead = None;
        if self.state != StreamState::Closed {
            debug!("closing async stream (was {:?})", self.state);
            self.state = StreamState::Closed;
        }
        self.inner = None;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn lines_read(&self) -> u64 {
        self.delivered
    }

    async fn read_ahead(&mut self) {
        self.lookahead = self.pull().await.transpose();
    }

    async fn pull(&mut self) -> Result<Option<String>> {
        loop {
            match self.state {
                StreamState::Open | StreamState::EofPending => {}
                StreamState::Eof => return Ok(None),
                _ => return Err(Error::Closed),
            }
            let extract = match self.buffer.try_extract() {
                Ok(extract) => extract,
                Err(e) => return Err(self.fail(e)),
            };
            match extract {
                Extract::Line(line) => return Ok(Some(line)),
                Extract::End => {
                    self.state = StreamState::Eof;
                    self.inner = None;
                    debug!("async stream drained");
                    return Ok(None);
                }
                Extract::NeedMore => {}
            }

            let Some(reader) = self.inner.as_mut() else {
                return Err(Error::Closed);
            };
            match reader.read(&mut self.chunk).await {
                Ok(0) => {
                    self.state = StreamState::EofPending;
                    if let Err(e) = self.buffer.finish() {
                        return Err(self.fail(e));
                    }
                }
                Ok(n) => self.buffer.push(&self.chunk[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(source) => return Err(self.fail(Error::Read { source })),
            }
        }
    }

    fn fail(&mut self, error: Error) -> Error {
        debug!("async stream failed: {error}");
        self.state = StreamState::Errored;
        self.inner = None;
        error
    }
}

/// Drives an [`AsyncLineReader`] to completion.
///
/// `on_line` receives each line and its `last` flag and returns a future; the
/// next line is not delivered until that future resolves, so at most one
/// callback is in flight. A resolved `Flow::Stop` ends iteration early;
/// `Flow::Defer` behaves like `Flow::Continue` since awaiting already is the
/// continuation. The reader is closed before this returns.
pub async fn each_line_async<R, F, Fut>(
    reader: R,
    config: ReaderConfig,
    mut on_line: F,
) -> (AsyncLineReader<R>, Result<()>)
where
    R: AsyncRead + Unpin,
    F: FnMut(String, bool) -> Fut,
    Fut: Future<Output = Flow>,
{
    let mut lines = AsyncLineReader::new(reader, config);
    let result = match lines.start().await {
        Ok(()) => loop {
            match lines.next_entry().await {
                Ok(line) => {
                    if on_line(line.text, line.last).await == Flow::Stop {
                        debug!("async line callback stopped iteration");
                        break Ok(());
                    }
                }
                Err(Error::Exhausted) => break Ok(()),
                Err(e) => break Err(e),
            }
        },
        Err(e) => Err(e),
    };
    lines.close();
    (lines, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// Yields its data, then fails.
    struct FailAfter {
        data: &'static [u8],
    }

    impl AsyncRead for FailAfter {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.data.is_empty() {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")));
            }
            let n = self.data.len().min(buf.remaining());
            buf.put_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn async_reader_matches_blocking_semantics() {
        let input: &[u8] = "ふう\r\nりう\r\n\r\n".as_bytes();
        let config = ReaderConfig::default().buffer_size(1);
        let mut reader = AsyncLineReader::open(input, config).await.unwrap();
        assert_eq!(reader.next_line().await.unwrap(), "ふう");
        assert_eq!(reader.next_line().await.unwrap(), "りう");
        let last = reader.next_entry().await.unwrap();
        assert_eq!(last.text, "");
        assert!(last.last);
        assert!(reader.is_closed());
        assert!(matches!(reader.next_line().await, Err(Error::Exhausted)));
    }

    #[tokio::test]
    async fn lines_before_invalid_bytes_are_delivered() {
        let config = ReaderConfig::default().buffer_size(1024);
        let mut reader = AsyncLineReader::open(&b"a\nb\n\xff"[..], config).await.unwrap();
        assert_eq!(reader.next_line().await.unwrap(), "a");
        assert_eq!(reader.next_line().await.unwrap(), "b");
        assert!(matches!(
            reader.next_line().await,
            Err(Error::Decoding { offset: 4, .. })
        ));
        assert!(reader.is_closed());
        assert_eq!(reader.state(), StreamState::Errored);
    }

    #[tokio::test]
    async fn each_line_async_stops_early() {
        let mut seen = Vec::new();
        let (reader, result) = each_line_async(
            &b"a\nb\nc\n"[..],
            ReaderConfig::default(),
            |line, _last| {
                seen.push(line);
                let stop = seen.len() == 2;
                async move {
                    tokio::task::yield_now().await;
                    Flow::from(!stop)
                }
            },
        )
        .await;
        assert!(result.is_ok());
        assert!(reader.is_closed());
        assert_eq!(seen, ["a", "b"]);
    }

    #[tokio::test]
    async fn each_line_async_reports_read_fault() {
        let mut count = 0;
        let (reader, result) = each_line_async(
            FailAfter { data: b"one\ntwo\n" },
            ReaderConfig::default().buffer_size(4),
            |_, _| {
                count += 1;
                async { Flow::Continue }
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Read { .. })));
        assert!(reader.is_closed());
        assert_eq!(count, 2);
    }
}
