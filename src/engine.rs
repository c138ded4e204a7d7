//! The buffering engine: owns the source and the unconsumed text, drives
//! refills, and holds the stream's lifecycle state.

use crate::buffer::{Extract, LineBuffer};
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::source::ByteSource;
use log::{debug, trace, warn};

/// Lifecycle of the underlying stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Created but the source has not been opened yet.
    Unopened,
    /// Open and readable.
    Open,
    /// The source reported end of input; buffered text may remain.
    EofPending,
    /// Every line has been extracted and the source was released.
    Eof,
    /// A terminal error occurred and the source was released.
    Errored,
    /// Closed explicitly.
    Closed,
}

impl StreamState {
    /// Whether the source handle has been released.
    pub fn is_released(self) -> bool {
        matches!(
            self,
            StreamState::Eof | StreamState::Errored | StreamState::Closed
        )
    }
}

/// Accumulates decoded text from a [`ByteSource`] and splits it into lines.
///
/// Reads are paced by consumption: a refill happens only when the buffer
/// cannot produce the requested line, and the source is paused between
/// requests.
#[derive(Debug)]
pub struct BufferEngine<S: ByteSource> {
    source: S,
    config: ReaderConfig,
    buffer: LineBuffer,
    chunk: Vec<u8>,
    state: StreamState,
    paused: bool,
    // The source's `close` has been called (successfully or not).
    released: bool,
    bytes_read: u64,
    lines: u64,
}

impl<S: ByteSource> BufferEngine<S> {
    /// Wraps `source` without opening it.
    pub fn new(source: S, config: ReaderConfig) -> Self {
        let buffer = LineBuffer::new(config.separator.clone(), config.encoding);
        Self {
            source,
            buffer,
            chunk: Vec::new(),
            state: StreamState::Unopened,
            paused: false,
            released: false,
            bytes_read: 0,
            lines: 0,
            config,
        }
    }

    /// Validates the configuration and opens the source.
    ///
    /// On failure the engine moves to [`StreamState::Errored`] with the source
    /// released. Opening an engine that is not `Unopened` is a no-op.
    pub fn open(&mut self) -> Result<()> {
        if self.state != StreamState::Unopened {
            return Ok(());
        }
        if let Err(e) = self.config.validate() {
            return Err(self.fail(e));
        }
        if let Err(source) = self.source.open() {
            return Err(self.fail(Error::Open { source }));
        }
        self.chunk = vec![0u8; self.config.buffer_size];
        self.state = StreamState::Open;
        debug!(
            "stream opened (separator: {:?}, encoding: {}, buffer size: {})",
            self.config.separator, self.config.encoding, self.config.buffer_size
        );
        Ok(())
    }

    /// Reads one chunk of at most `buffer_size` bytes into the buffer.
    pub fn refill(&mut self) -> Result<()> {
        match self.state {
            StreamState::Open => {}
            StreamState::EofPending | StreamState::Eof => return Ok(()),
            StreamState::Unopened | StreamState::Errored | StreamState::Closed => {
                return Err(Error::Closed)
            }
        }
        if self.paused {
            self.source.resume();
            self.paused = false;
        }

        match self.source.read_chunk(&mut self.chunk) {
            Ok(0) => {
                self.state = StreamState::EofPending;
                debug!(
                    "end of input after {} bytes ({} bytes unconsumed)",
                    self.bytes_read,
                    self.buffer.unconsumed().len()
                );
                match self.buffer.finish() {
                    Ok(()) => Ok(()),
                    Err(e) => Err(self.fail(e)),
                }
            }
            Ok(n) => {
                self.bytes_read += n as u64;
                trace!(
                    "refilled {n} bytes ({} held back by the decoder)",
                    self.buffer.held_back()
                );
                self.buffer.push(&self.chunk[..n]);
                Ok(())
            }
            Err(source) => Err(self.fail(Error::Read { source })),
        }
    }

    /// Extracts a line from what is already buffered.
    ///
    /// `Ok(None)` means "insufficient data" while the state is `Open` (refill
    /// and retry), and "no further line" otherwise. Reaching the end moves the
    /// engine to [`StreamState::Eof`] and releases the source.
    pub fn try_extract_line(&mut self) -> Result<Option<String>> {
        if !matches!(self.state, StreamState::Open | StreamState::EofPending) {
            return Ok(None);
        }
        let extract = match self.buffer.try_extract() {
            Ok(extract) => extract,
            Err(e) => return Err(self.fail(e)),
        };
        match extract {
            Extract::Line(line) => {
                self.lines += 1;
                Ok(Some(line))
            }
            Extract::NeedMore => Ok(None),
            Extract::End => {
                self.state = StreamState::Eof;
                debug!("stream drained after {} lines", self.lines);
                self.release().map_err(|source| Error::Close { source })?;
                Ok(None)
            }
        }
    }

    /// Returns the next line, refilling as needed. `Ok(None)` at end of input.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            match self.state {
                StreamState::Unopened => self.open()?,
                StreamState::Open | StreamState::EofPending => {}
                StreamState::Eof => return Ok(None),
                StreamState::Errored | StreamState::Closed => return Err(Error::Closed),
            }
            if let Some(line) = self.try_extract_line()? {
                if self.state == StreamState::Open && !self.paused {
                    self.source.pause();
                    self.paused = true;
                }
                return Ok(Some(line));
            }
            match self.state {
                StreamState::Open => self.refill()?,
                _ => return Ok(None),
            }
        }
    }

    /// Releases the source and moves to [`StreamState::Closed`] from any
    /// state. Only the first call can report a close failure.
    pub fn close(&mut self) -> Result<()> {
        let released = self.release();
        if self.state != StreamState::Closed {
            debug!("closing stream (was {:?})", self.state);
            self.state = StreamState::Closed;
        }
        released.map_err(|source| Error::Close { source })
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Whether the source has been released (explicit close, end of input or
    /// a terminal error).
    pub fn is_closed(&self) -> bool {
        self.released
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn lines_extracted(&self) -> u64 {
        self.lines
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// The single terminal transition every error path goes through: mark the
    /// engine errored, release the source, and keep any close failure.
    fn fail(&mut self, error: Error) -> Error {
        debug!("stream failed: {error}");
        let released = self.release();
        self.state = StreamState::Errored;
        match released {
            Ok(()) => error,
            Err(close) => {
                warn!("closing stream after failure also failed: {close}");
                error.with_close_failure(close)
            }
        }
    }

    /// Calls the source's `close` at most once. A source that was never
    /// opened has nothing to close; it is only marked released, so callers
    /// leaving `Unopened` update `state` after this returns.
    fn release(&mut self) -> std::io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.paused = false;
        if self.state == StreamState::Unopened {
            return Ok(());
        }
        self.source.close()
    }
}
