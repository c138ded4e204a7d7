//! The push API: drives a [`LineReader`] to completion, invoking a callback
//! per line.
//!
//! The line callback decides how iteration proceeds by returning a [`Flow`]:
//!
//! * `Flow::Continue` delivers the next line right away,
//! * `Flow::Stop` ends iteration early,
//! * `Flow::Defer` suspends iteration. [`LineIteration::drive`] hands back a
//!   [`Continuation`], and no further line is delivered until that
//!   continuation is passed to [`LineIteration::resume`].
//!
//! Whatever ends the iteration (exhaustion, early stop, or an error), the
//! reader is closed first and then the completion callback runs exactly once.

use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::reader::LineReader;
use crate::source::{ByteSource, PathSource};
use log::debug;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ITERATION_ID: AtomicU64 = AtomicU64::new(1);

/// What the line callback wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
    /// Suspend until the returned [`Continuation`] is resumed.
    Defer,
}

impl From<bool> for Flow {
    /// `true` keeps going, `false` stops.
    fn from(keep_going: bool) -> Self {
        if keep_going {
            Flow::Continue
        } else {
            Flow::Stop
        }
    }
}

/// Single-use token for the one line callback currently suspended.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "iteration stays suspended until the continuation is resumed"]
pub struct Continuation {
    iteration: u64,
    ticket: u64,
}

/// Result of driving or resuming an iteration.
#[derive(Debug)]
#[must_use]
pub enum Progress {
    /// The line callback deferred; pass the continuation to `resume`.
    Suspended(Continuation),
    /// The request was refused: another continuation is outstanding, or the
    /// continuation does not belong to this iteration.
    Rejected,
    /// Iteration is over. Driving a finished iteration again reports
    /// `Error::Closed`.
    Finished(Result<()>),
}

impl Progress {
    pub fn is_finished(&self) -> bool {
        matches!(self, Progress::Finished(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unstarted,
    Ready,
    Suspended { ticket: u64 },
    Finished,
}

/// The line iteration controller.
///
/// ```rust
/// use linestream::{each_line, Flow, ReadSource, ReaderConfig};
/// use std::io::Cursor;
///
/// let mut seen = Vec::new();
/// let (iteration, progress) = each_line(
///     ReadSource::new(Cursor::new("a\nb\nc\n")),
///     ReaderConfig::default(),
///     |line, _last| {
///         seen.push(line.to_owned());
///         if line == "b" { Flow::Stop } else { Flow::Continue }
///     },
///     |err| assert!(err.is_none()),
/// );
/// assert!(matches!(progress, linestream::Progress::Finished(Ok(()))));
/// assert!(iteration.reader().is_closed());
/// drop(iteration);
/// assert_eq!(seen, ["a", "b"]);
/// ```
pub struct LineIteration<S, F, C = fn(Option<&Error>)>
where
    S: ByteSource,
{
    reader: LineReader<S>,
    on_line: F,
    on_complete: Option<C>,
    phase: Phase,
    id: u64,
    tickets: u64,
}

impl<S, F> LineIteration<S, F>
where
    S: ByteSource,
    F: FnMut(&str, bool) -> Flow,
{
    /// Iterates an already-open reader.
    pub fn new(reader: LineReader<S>, on_line: F) -> Self {
        Self::with_phase(reader, on_line, Phase::Ready)
    }

    /// Opens `source` on the first `drive`. An open failure completes the
    /// iteration with that error; the closed reader stays inspectable.
    pub fn open(source: S, config: ReaderConfig, on_line: F) -> Self {
        Self::with_phase(LineReader::unopened(source, config), on_line, Phase::Unstarted)
    }

    fn with_phase(reader: LineReader<S>, on_line: F, phase: Phase) -> Self {
        Self {
            reader,
            on_line,
            on_complete: None,
            phase,
            id: NEXT_ITERATION_ID.fetch_add(1, Ordering::Relaxed),
            tickets: 0,
        }
    }
}

impl<S, F, C> LineIteration<S, F, C>
where
    S: ByteSource,
    F: FnMut(&str, bool) -> Flow,
    C: FnOnce(Option<&Error>),
{
    /// Sets the callback run once when iteration ends, after the reader has
    /// been closed. It receives the error that ended iteration, if any.
    pub fn on_complete<C2>(self, on_complete: C2) -> LineIteration<S, F, C2>
    where
        C2: FnOnce(Option<&Error>),
    {
        LineIteration {
            reader: self.reader,
            on_line: self.on_line,
            on_complete: Some(on_complete),
            phase: self.phase,
            id: self.id,
            tickets: self.tickets,
        }
    }

    /// Delivers lines until the stream ends, the callback stops, or the
    /// callback defers.
    pub fn drive(&mut self) -> Progress {
        match self.phase {
            Phase::Unstarted => {
                self.phase = Phase::Ready;
                match self.reader.start() {
                    Ok(()) => self.run(),
                    Err(e) => self.complete(Some(e)),
                }
            }
            Phase::Ready => self.run(),
            Phase::Suspended { .. } => Progress::Rejected,
            Phase::Finished => Progress::Finished(Err(Error::Closed)),
        }
    }

    /// Fires the continuation of the suspended line callback. With `stop`
    /// set, iteration ends as if the callback had returned `Flow::Stop`.
    pub fn resume(&mut self, continuation: Continuation, stop: bool) -> Progress {
        match self.phase {
            Phase::Suspended { ticket }
                if continuation.iteration == self.id && continuation.ticket == ticket =>
            {
                self.phase = Phase::Ready;
                if stop {
                    debug!("line callback stopped iteration after resuming");
                    self.complete(None)
                } else {
                    self.run()
                }
            }
            Phase::Finished => Progress::Finished(Err(Error::Closed)),
            _ => Progress::Rejected,
        }
    }

    /// The reader being driven. After completion it is closed.
    pub fn reader(&self) -> &LineReader<S> {
        &self.reader
    }

    pub fn reader_mut(&mut self) -> &mut LineReader<S> {
        &mut self.reader
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self.phase, Phase::Suspended { .. })
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Gives the reader back, e.g. once iteration has finished.
    pub fn into_reader(self) -> LineReader<S> {
        self.reader
    }

    fn run(&mut self) -> Progress {
        loop {
            let line = match self.reader.next_entry() {
                Ok(line) => line,
                Err(Error::Exhausted) => return self.complete(None),
                Err(e) => return self.complete(Some(e)),
            };
            match (self.on_line)(&line.text, line.last) {
                Flow::Continue => {}
                Flow::Stop => {
                    debug!("line callback stopped iteration");
                    return self.complete(None);
                }
                Flow::Defer => {
                    self.tickets += 1;
                    self.phase = Phase::Suspended {
                        ticket: self.tickets,
                    };
                    return Progress::Suspended(Continuation {
                        iteration: self.id,
                        ticket: self.tickets,
                    });
                }
            }
        }
    }

    fn complete(&mut self, error: Option<Error>) -> Progress {
        self.phase = Phase::Finished;
        let result = match (error, self.reader.close()) {
            (None, Ok(())) => Ok(()),
            (None, Err(close)) => Err(close),
            (Some(e), Ok(())) => Err(e),
            (Some(e), Err(Error::Close { source })) => Err(e.with_close_failure(source)),
            (Some(e), Err(_)) => Err(e),
        };
        debug!(
            "line iteration finished after {} lines: {:?}",
            self.reader.lines_read(),
            result.as_ref().err()
        );
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(result.as_ref().err());
        }
        Progress::Finished(result)
    }
}

/// Opens `source` and drives an iteration over its lines.
///
/// Returns the controller (which exposes the reader and resumes deferred
/// callbacks) and the progress of the first drive.
pub fn each_line<S, F, C>(
    source: S,
    config: ReaderConfig,
    on_line: F,
    on_complete: C,
) -> (LineIteration<S, F, C>, Progress)
where
    S: ByteSource,
    F: FnMut(&str, bool) -> Flow,
    C: FnOnce(Option<&Error>),
{
    let mut iteration = LineIteration::open(source, config, on_line).on_complete(on_complete);
    let progress = iteration.drive();
    (iteration, progress)
}

/// [`each_line`] over the file at `path`.
pub fn each_line_path<F, C>(
    path: impl AsRef<Path>,
    config: ReaderConfig,
    on_line: F,
    on_complete: C,
) -> (LineIteration<PathSource, F, C>, Progress)
where
    F: FnMut(&str, bool) -> Flow,
    C: FnOnce(Option<&Error>),
{
    each_line(PathSource::new(path), config, on_line, on_complete)
}
