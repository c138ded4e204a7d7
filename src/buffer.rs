//! Sans-IO accumulation of decoded text and line extraction.
//!
//! `LineBuffer` knows nothing about where bytes come from. Drivers (the
//! blocking [`BufferEngine`](crate::engine::BufferEngine) and the tokio reader)
//! push raw chunks in, mark the end of input, and pull lines out.

use crate::decode::{Decoder, Encoding};
use crate::error::{Error, Result};
use crate::separator::{Separator, Split};

/// Result of asking the buffer for a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Extract {
    /// A complete line, separator removed.
    Line(String),
    /// The buffer cannot produce a line until more input arrives.
    NeedMore,
    /// End of input and nothing left to deliver.
    End,
}

#[derive(Debug)]
pub(crate) struct LineBuffer {
    separator: Separator,
    decoder: Decoder,
    text: String,
    // Start of unconsumed text.
    cursor: usize,
    // Where the next separator search begins; everything between `cursor`
    // and here is already known to be separator free.
    scan_from: usize,
    eof: bool,
    // Decoding failure hit by the last push, reported once the lines decoded
    // before it are used up.
    failure: Option<Error>,
}

impl LineBuffer {
    pub(crate) fn new(separator: Separator, encoding: Encoding) -> Self {
        Self {
            separator,
            decoder: Decoder::new(encoding),
            text: String::new(),
            cursor: 0,
            scan_from: 0,
            eof: false,
            failure: None,
        }
    }

    /// Decodes a raw chunk onto the end of the unconsumed text.
    ///
    /// A decoding failure does not surface here: the text decoded before the
    /// bad sequence is kept and the failure is returned by the `try_extract`
    /// that runs out of complete lines.
    pub(crate) fn push(&mut self, chunk: &[u8]) {
        self.compact();
        if let Err(e) = self.decoder.decode(chunk, &mut self.text) {
            self.failure.get_or_insert(e);
        }
    }

    /// Marks the end of input. Fails if an incomplete character is still
    /// held back by the decoder.
    pub(crate) fn finish(&mut self) -> Result<()> {
        self.eof = true;
        self.decoder.finish()
    }

    /// Decoded characters not yet surfaced as part of a line.
    pub(crate) fn unconsumed(&self) -> &str {
        &self.text[self.cursor..]
    }

    /// Raw bytes held back by the decoder.
    pub(crate) fn held_back(&self) -> usize {
        self.decoder.pending_len()
    }

    pub(crate) fn try_extract(&mut self) -> Result<Extract> {
        let rest = &self.text[self.cursor..];
        match self
            .separator
            .find(rest, self.scan_from - self.cursor, self.eof)
        {
            Split::Found { end, next } => {
                let line = rest[..end].to_owned();
                self.cursor += next;
                self.scan_from = self.cursor;
                Ok(Extract::Line(line))
            }
            Split::NeedMore { resume_at } if !self.eof => {
                self.scan_from = self.cursor + resume_at;
                match self.failure.take() {
                    Some(e) => Err(e),
                    None => Ok(Extract::NeedMore),
                }
            }
            // At end of input the remainder, if any, is the final line.
            Split::NeedMore { .. } if rest.is_empty() => Ok(Extract::End),
            Split::NeedMore { .. } => {
                let line = rest.to_owned();
                self.cursor = self.text.len();
                self.scan_from = self.cursor;
                Ok(Extract::Line(line))
            }
        }
    }

    /// Drops consumed text so the buffer only ever holds a partial line.
    fn compact(&mut self) {
        if self.cursor > 0 {
            self.text.drain(..self.cursor);
            self.scan_from -= self.cursor;
            self.cursor = 0;
        }
    }
}
