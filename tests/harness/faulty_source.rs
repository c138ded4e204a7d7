use linestream::ByteSource;
use std::io::{self, Read};

/// Wraps a `Read` and misbehaves in a configurable way.
pub struct FaultySource<R: Read> {
    inner: R,
    mode: FaultMode,
    reads: usize,
    pub closes: usize,
    pub pauses: usize,
    pub resumes: usize,
    fail_close: bool,
}

#[allow(dead_code)]
pub enum FaultMode {
    /// Hands out at most `n` bytes per read.
    ChunksOf(usize),
    /// Cycles through the given chunk sizes.
    ChunkPattern(Vec<usize>),
    /// The nth read (1-based) fails with the message; earlier reads pass through.
    FailOnRead(usize, &'static str),
    /// Opening fails.
    FailOpen,
}

#[allow(dead_code)]
impl<R: Read> FaultySource<R> {
    pub fn new(inner: R, mode: FaultMode) -> Self {
        Self {
            inner,
            mode,
            reads: 0,
            closes: 0,
            pauses: 0,
            resumes: 0,
            fail_close: false,
        }
    }

    /// Makes `close` fail as well.
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Switches the fault mode mid-stream.
    pub fn set_mode(&mut self, mode: FaultMode) {
        self.mode = mode;
    }
}

impl<R: Read> ByteSource for FaultySource<R> {
    fn open(&mut self) -> io::Result<()> {
        match self.mode {
            FaultMode::FailOpen => Err(io::Error::new(io::ErrorKind::NotFound, "no such stream")),
            _ => Ok(()),
        }
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        let limit = match &self.mode {
            FaultMode::ChunksOf(n) => *n,
            FaultMode::ChunkPattern(sizes) => sizes[(self.reads - 1) % sizes.len()],
            FaultMode::FailOnRead(n, message) if self.reads >= *n => {
                return Err(io::Error::new(io::ErrorKind::Other, *message));
            }
            FaultMode::FailOnRead(..) | FaultMode::FailOpen => buf.len(),
        };
        let limit = limit.clamp(1, buf.len());
        self.inner.read(&mut buf[..limit])
    }

    fn pause(&mut self) {
        self.pauses += 1;
    }

    fn resume(&mut self) {
        self.resumes += 1;
    }

    fn close(&mut self) -> io::Result<()> {
        self.closes += 1;
        if self.fail_close {
            Err(io::Error::new(io::ErrorKind::Other, "close failed"))
        } else {
            Ok(())
        }
    }
}
