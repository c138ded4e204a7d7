//! Boundary-safe incremental decoding of raw byte chunks into text.
//!
//! A refill can end anywhere, including in the middle of a multi-byte
//! character. The decoder never decodes such an incomplete tail: the bytes are
//! held back and prefixed onto the next chunk, so the decoded text is the same
//! no matter where chunk boundaries fall.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Character encoding applied to the raw bytes of a stream.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// Strict UTF-8. Malformed sequences are reported, never replaced.
    #[default]
    Utf8,
    /// Little-endian UTF-16, surrogate pairs included.
    Utf16Le,
    /// ISO-8859-1: every byte maps to the codepoint of the same value.
    Latin1,
}

impl Encoding {
    /// The longest byte sequence that can encode a single `char`.
    pub fn max_char_len(self) -> usize {
        match self {
            Encoding::Utf8 | Encoding::Utf16Le => 4,
            Encoding::Latin1 => 1,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Latin1 => "latin1",
        })
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(label: &str) -> Result<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => Ok(Encoding::Utf16Le),
            "latin1" | "binary" | "iso-8859-1" | "iso8859-1" => Ok(Encoding::Latin1),
            other => Err(Error::invalid_config(format!("unknown encoding `{other}`"))),
        }
    }
}

/// Stateful decoder for one stream.
#[derive(Debug)]
pub(crate) struct Decoder {
    encoding: Encoding,
    // Incomplete trailing sequence from the previous chunk.
    pending: Vec<u8>,
    // Absolute stream offset of the first byte not yet decoded.
    offset: u64,
}

impl Decoder {
    pub(crate) fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            pending: Vec::with_capacity(encoding.max_char_len()),
            offset: 0,
        }
    }

    /// Number of bytes held back waiting for the rest of their character.
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Decodes `chunk` (prefixed by any held-back bytes) and appends the text
    /// to `out`. A trailing incomplete character is held back. On an invalid
    /// sequence, everything before it has still been appended.
    pub(crate) fn decode(&mut self, chunk: &[u8], out: &mut String) -> Result<()> {
        match self.encoding {
            Encoding::Latin1 => {
                out.extend(chunk.iter().map(|&b| char::from(b)));
                self.offset += chunk.len() as u64;
                Ok(())
            }
            Encoding::Utf8 => self.decode_utf8(chunk, out),
            Encoding::Utf16Le => self.decode_utf16le(chunk, out),
        }
    }

    /// Called once the stream is exhausted. Bytes still held back can never be
    /// completed and are reported as a decoding error.
    pub(crate) fn finish(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            self.pending.clear();
            Err(self.error_at(0))
        }
    }

    fn error_at(&self, relative: usize) -> Error {
        Error::Decoding {
            encoding: self.encoding,
            offset: self.offset + relative as u64,
        }
    }

    fn decode_utf8(&mut self, chunk: &[u8], out: &mut String) -> Result<()> {
        let mut joined = std::mem::take(&mut self.pending);
        let bytes: &[u8] = if joined.is_empty() {
            chunk
        } else {
            joined.extend_from_slice(chunk);
            &joined
        };

        match std::str::from_utf8(bytes) {
            Ok(text) => {
                out.push_str(text);
                self.offset += bytes.len() as u64;
                Ok(())
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                if let Ok(text) = std::str::from_utf8(valid) {
                    out.push_str(text);
                }
                self.offset += valid.len() as u64;
                if e.error_len().is_some() {
                    // Text before the invalid sequence is kept.
                    return Err(self.error_at(0));
                }
                self.pending = rest.to_vec();
                Ok(())
            }
        }
    }

    fn decode_utf16le(&mut self, chunk: &[u8], out: &mut String) -> Result<()> {
        let mut joined = std::mem::take(&mut self.pending);
        let bytes: &[u8] = if joined.is_empty() {
            chunk
        } else {
            joined.extend_from_slice(chunk);
            &joined
        };

        let mut end = bytes.len() & !1;
        if end >= 2 {
            let last = u16::from_le_bytes([bytes[end - 2], bytes[end - 1]]);
            // A high surrogate needs the next unit before it can be decoded.
            if (0xD800..0xDC00).contains(&last) {
                end -= 2;
            }
        }

        let units = bytes[..end]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
        let mut consumed = 0usize;
        for unit in char::decode_utf16(units) {
            match unit {
                Ok(c) => {
                    out.push(c);
                    consumed += c.len_utf16() * 2;
                }
                Err(_) => {
                    self.offset += consumed as u64;
                    return Err(self.error_at(0));
                }
            }
        }

        self.offset += end as u64;
        self.pending = bytes[end..].to_vec();
        Ok(())
    }
}
