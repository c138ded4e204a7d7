//! The readable-stream capability consumed by the engine, plus adapters for
//! `std::io::Read` values and filesystem paths.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// A stream of raw byte chunks that can be paused, resumed and closed.
///
/// Decouples the line engine from how a resource was obtained.
/// Implementations deliver chunks of any size; `Ok(0)` signals end of input.
pub trait ByteSource {
    /// Acquires or validates the underlying resource. Called once, before the
    /// first read.
    fn open(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Reads at most `buf.len()` bytes. Returns `Ok(0)` at end of input.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Called when the engine has buffered enough to satisfy the current
    /// request and will not read again until asked for another line.
    fn pause(&mut self) {}

    /// Called before a read that follows a `pause`.
    fn resume(&mut self) {}

    /// Releases the resource. The engine calls this at most once, and never
    /// when `open` failed or was not reached.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn open(&mut self) -> io::Result<()> {
        (**self).open()
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_chunk(buf)
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn resume(&mut self) {
        (**self).resume()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Adapts any `Read` into a [`ByteSource`]. Closing drops the reader.
#[derive(Debug)]
pub struct ReadSource<R: Read> {
    inner: Option<R>,
    paused: bool,
}

impl<R: Read> ReadSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: Some(reader),
            paused: false,
        }
    }

    /// The wrapped reader, or `None` once closed.
    pub fn get_ref(&self) -> Option<&R> {
        self.inner.as_ref()
    }

    /// Mutable access to the wrapped reader, or `None` once closed.
    ///
    /// The engine owns the stream while a reader is open; mutating it from
    /// outside is only meant for fault injection in tests.
    pub fn get_mut(&mut self) -> Option<&mut R> {
        self.inner.as_mut()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl<R: Read> From<R> for ReadSource<R> {
    fn from(reader: R) -> Self {
        ReadSource::new(reader)
    }
}

impl<R: Read> ByteSource for ReadSource<R> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(reader) = self.inner.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "stream closed"));
        };
        loop {
            match reader.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner = None;
        Ok(())
    }
}

/// A file opened lazily from a path when the engine opens its source.
#[derive(Debug)]
pub struct PathSource {
    path: PathBuf,
    file: Option<ReadSource<File>>,
}

impl PathSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for PathSource {
    fn open(&mut self) -> io::Result<()> {
        let file = File::open(&self.path)?;
        self.file = Some(ReadSource::new(file));
        Ok(())
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.read_chunk(buf),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("{} is not open", self.path.display()),
            )),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(mut file) => file.close(),
            None => Ok(()),
        }
    }
}
