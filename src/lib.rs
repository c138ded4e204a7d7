//! # linestream (v0.1.0)
//!
//! A streaming line reader: splits an arbitrary byte stream into lines
//! delimited by a configurable separator, without holding the whole input in
//! memory.
//!
//! ## Overview
//!
//! Bytes arrive from the underlying stream in chunks of unpredictable size.
//! `linestream` accumulates them, decodes them to text without ever splitting
//! a multi-byte character, and finds separators even when one straddles two
//! chunks. Lines can be pulled one at a time or pushed to a callback that may
//! stop or suspend iteration.
//!
//! ## Key Features
//!
//! * **Boundary Safe**: `\r\n` split across reads is one boundary; a character
//!   split across reads decodes to the right codepoint
//! * **Any Separator**: auto-detected `\r\n`/`\n`/`\r` line endings, or a literal
//!   pattern of any length
//! * **Paced Reads**: the stream is read only when the buffer cannot satisfy a
//!   pending line request
//! * **Lifecycle Managed**: the stream is closed on end of input, on error, or on
//!   early termination, and close failures are reported rather than dropped
//!
//! ## Quick Start
//!
//! ```rust
//! use linestream::*;
//! use std::io::Cursor;
//!
//! fn main() -> Result<()> {
//!     // Pull API
//!     let input = Cursor::new("first\r\nsecond\nthird");
//!     let mut reader = LineReader::from_reader(input, ReaderConfig::default())?;
//!     while reader.has_next_line() {
//!         let line = reader.next_entry()?;
//!         println!("{} (last: {})", line.text, line.last);
//!     }
//!
//!     // Push API with a custom separator
//!     let source = ReadSource::new(Cursor::new("a||b||c"));
//!     let config = ReaderConfig::default().separator("||").buffer_size(2);
//!     let (_iteration, progress) = each_line(
//!         source,
//!         config,
//!         |line, last| {
//!             println!("{line} (last: {last})");
//!             Flow::Continue
//!         },
//!         |err| assert!(err.is_none()),
//!     );
//!     assert!(progress.is_finished());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! * **`Separator`**: pure matcher that finds the next boundary or asks for more input
//! * **`BufferEngine`**: owns a **`ByteSource`** and the unconsumed text, drives refills,
//!   and owns the stream's lifecycle state
//! * **`LineReader`**: pull API with one line of lookahead
//! * **`LineIteration`**: push API driving a `LineReader`
//!
//! With the `tokio` feature, **`AsyncLineReader`** and `each_line_async` provide the
//! same semantics over `tokio::io::AsyncRead`.

mod buffer;
pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod iteration;
pub mod reader;
pub mod separator;
pub mod source;

#[cfg(feature = "tokio")]
pub mod async_reader;

// Re-export the main public API for user convenience.
pub use config::{ReaderConfig, DEFAULT_BUFFER_SIZE};
pub use decode::Encoding;
pub use engine::{BufferEngine, StreamState};
pub use error::{Error, Result};
pub use iteration::{each_line, each_line_path, Continuation, Flow, LineIteration, Progress};
pub use reader::{Line, LineReader, Lines};
pub use separator::Separator;
pub use source::{ByteSource, PathSource, ReadSource};

#[cfg(feature = "tokio")]
pub use async_reader::{each_line_async, AsyncLineReader};
