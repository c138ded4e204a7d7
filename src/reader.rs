//! The pull API: a stateful cursor over a [`BufferEngine`].

use crate::config::ReaderConfig;
use crate::engine::{BufferEngine, StreamState};
use crate::error::{Error, Result};
use crate::source::{ByteSource, PathSource, ReadSource};
use std::io::Read;
use std::path::Path;

/// A line together with its position in the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    /// No further line follows this one.
    pub last: bool,
}

/// A reader for streaming lines from a [`ByteSource`].
///
/// The reader keeps exactly one line of lookahead: opening reads up to the
/// first line, and every `next_line` reads up to the one after it. That makes
/// [`has_next_line`](LineReader::has_next_line) a pure query (it never
/// triggers a refill) and lets each line carry its `last` flag.
///
/// ```rust
/// use linestream::{LineReader, ReaderConfig};
/// use std::io::Cursor;
///
/// let mut reader = LineReader::from_reader(Cursor::new("a\r\nb\n"), ReaderConfig::default())?;
/// assert!(reader.has_next_line());
/// assert_eq!(reader.next_line()?, "a");
/// assert_eq!(reader.next_line()?, "b");
/// assert!(!reader.has_next_line());
/// assert!(reader.is_closed());
/// # Ok::<(), linestream::Error>(())
/// ```
#[derive(Debug)]
pub struct LineReader<S: ByteSource> {
    engine: BufferEngine<S>,
    // The next line, or the failure hit while reading ahead for it.
    lookahead: Option<Result<String>>,
    // Closing the source failed after the last line was read ahead. Kept out
    // of `lookahead` so the last line is still flagged as last.
    close_failure: Option<Error>,
    delivered: u64,
}

impl<S: ByteSource> LineReader<S> {
    /// Opens `source` and reads ahead to the first line.
    ///
    /// A read failure while reading ahead does not fail `open`; it is
    /// reported by the first `next_line`.
    pub fn open(source: S, config: ReaderConfig) -> Result<Self> {
        let mut reader = Self::unopened(source, config);
        reader.start()?;
        Ok(reader)
    }

    pub(crate) fn unopened(source: S, config: ReaderConfig) -> Self {
        Self {
            engine: BufferEngine::new(source, config),
            lookahead: None,
            close_failure: None,
            delivered: 0,
        }
    }

    /// Opens the engine and primes the lookahead. On failure the reader is
    /// left closed.
    pub(crate) fn start(&mut self) -> Result<()> {
        self.engine.open()?;
        self.read_ahead();
        Ok(())
    }

    /// Whether another line (or a pending failure) can be taken. Never reads.
    pub fn has_next_line(&self) -> bool {
        self.lookahead.is_some()
    }

    /// Returns the next line.
    ///
    /// # Errors
    /// * `Error::Exhausted` - the stream has no lines left
    /// * `Error::Closed` - the reader was closed, or already reported a failure
    /// * `Error::Read`/`Error::Decoding` - reading ahead failed; the reader has
    ///   been closed
    /// * `Error::Close` - every line was delivered but releasing the source
    ///   failed; reported once, then `Error::Exhausted`
    pub fn next_line(&mut self) -> Result<String> {
        match self.lookahead.take() {
            Some(Ok(line)) => {
                self.delivered += 1;
                self.read_ahead();
                Ok(line)
            }
            Some(Err(e)) => Err(e),
            None => {
                if let Some(e) = self.close_failure.take() {
                    return Err(e);
                }
                Err(match self.engine.state() {
                    StreamState::Eof => Error::Exhausted,
                    _ => Error::Closed,
                })
            }
        }
    }

    /// Like [`next_line`](LineReader::next_line), also reporting whether the
    /// line is the last one.
    pub fn next_entry(&mut self) -> Result<Line> {
        let text = self.next_line()?;
        Ok(Line {
            text,
            last: !self.has_next_line(),
        })
    }

    /// Releases the source and drops any line read ahead.
    ///
    /// A close failure from draining the stream that was not yet reported by
    /// `next_line` is returned here. Closing an already-closed reader
    /// otherwise succeeds silently.
    pub fn close(&mut self) -> Result<()> {
        self.lookahead = None;
        let closed = self.engine.close();
        match self.close_failure.take() {
            Some(e) => Err(e),
            None => closed,
        }
    }

    /// True after an explicit close, after the last line was read ahead, or
    /// after a terminal error.
    pub fn is_closed(&self) -> bool {
        self.engine.is_closed()
    }

    pub fn state(&self) -> StreamState {
        self.engine.state()
    }

    pub fn config(&self) -> &ReaderConfig {
        self.engine.config()
    }

    /// Lines handed to the caller so far.
    pub fn lines_read(&self) -> u64 {
        self.delivered
    }

    /// The underlying source.
    pub fn get_ref(&self) -> &S {
        self.engine.source()
    }

    /// Mutable access to the underlying source. The reader owns the stream
    /// while open; this exists for inspection and fault injection.
    pub fn get_mut(&mut self) -> &mut S {
        self.engine.source_mut()
    }

    /// Returns an iterator over the remaining lines.
    ///
    /// Iteration stops after the last line or after yielding an error.
    pub fn lines(&mut self) -> Lines<'_, S> {
        Lines { reader: self }
    }

    fn read_ahead(&mut self) {
        self.lookahead = match self.engine.next_line() {
            Ok(line) => line.map(Ok),
            // The stream drained; only releasing it failed.
            Err(e) if self.engine.state() == StreamState::Eof => {
                self.close_failure = Some(e);
                None
            }
            Err(e) => Some(Err(e)),
        };
    }
}

impl LineReader<PathSource> {
    /// Opens the file at `path`.
    pub fn open_path(path: impl AsRef<Path>, config: ReaderConfig) -> Result<Self> {
        Self::open(PathSource::new(path), config)
    }
}

impl<R: Read> LineReader<ReadSource<R>> {
    /// Reads lines from an already-open `Read`.
    pub fn from_reader(reader: R, config: ReaderConfig) -> Result<Self> {
        Self::open(ReadSource::new(reader), config)
    }
}

impl<'a, S: ByteSource> IntoIterator for &'a mut LineReader<S> {
    type Item = Result<String>;
    type IntoIter = Lines<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines()
    }
}

/// Iterator over the remaining lines of a [`LineReader`].
#[derive(Debug)]
pub struct Lines<'a, S: ByteSource> {
    reader: &'a mut LineReader<S>,
}

impl<S: ByteSource> Iterator for Lines<'_, S> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.reader.has_next_line() {
            return self.reader.close_failure.take().map(Err);
        }
        Some(self.reader.next_line())
    }
}
