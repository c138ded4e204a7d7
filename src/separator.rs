//! Locates line boundaries in decoded text.
//!
//! Keeps the "longest match, defer on an ambiguous tail" rule in one
//! place. The matcher is pure: it never reads, it only reports where the next
//! boundary is or that more input is needed to decide.

use crate::error::{Error, Result};
use memchr::memmem;

/// The delimiter that marks line boundaries.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Separator {
    /// Any of `\r\n`, `\n` or `\r`, detected independently at each boundary.
    #[default]
    Auto,
    /// A fixed pattern of one or more characters.
    Literal(String),
}

/// Outcome of a single search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Split {
    /// Line content is `text[..end]`; the separator spans `end..next`.
    Found { end: usize, next: usize },
    /// No boundary can be confirmed yet. Text before `resume_at` is known to
    /// hold no boundary start, so the next search may begin there.
    NeedMore { resume_at: usize },
}

impl Separator {
    /// A literal separator. Use [`Separator::Auto`] for the line-ending default.
    pub fn literal(pattern: impl Into<String>) -> Self {
        Separator::Literal(pattern.into())
    }

    /// Rejects an empty literal pattern.
    pub fn validate(&self) -> Result<()> {
        match self {
            Separator::Literal(p) if p.is_empty() => {
                Err(Error::invalid_config("separator must not be empty"))
            }
            _ => Ok(()),
        }
    }

    /// The separator text, or `None` in auto-detect mode.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Separator::Auto => None,
            Separator::Literal(p) => Some(p),
        }
    }

    /// Searches `text[from..]` for the earliest boundary.
    ///
    /// `eof` tells the matcher that `text` is all the input there will ever be,
    /// which resolves a trailing `\r` in auto mode.
    pub(crate) fn find(&self, text: &str, from: usize, eof: bool) -> Split {
        let bytes = text.as_bytes();
        let from = from.min(bytes.len());
        match self {
            Separator::Auto => find_line_ending(bytes, from, eof),
            Separator::Literal(pattern) => {
                let needle = pattern.as_bytes();
                match memmem::find(&bytes[from..], needle) {
                    Some(rel) => Split::Found {
                        end: from + rel,
                        next: from + rel + needle.len(),
                    },
                    // The tail may hold a strict prefix of the pattern.
                    None => Split::NeedMore {
                        resume_at: bytes
                            .len()
                            .saturating_sub(needle.len().saturating_sub(1))
                            .max(from),
                    },
                }
            }
        }
    }
}

impl From<&str> for Separator {
    fn from(pattern: &str) -> Self {
        Separator::literal(pattern)
    }
}

impl From<String> for Separator {
    fn from(pattern: String) -> Self {
        Separator::Literal(pattern)
    }
}

fn find_line_ending(bytes: &[u8], from: usize, eof: bool) -> Split {
    let Some(rel) = memchr::memchr2(b'\r', b'\n', &bytes[from..]) else {
        return Split::NeedMore {
            resume_at: bytes.len(),
        };
    };
    let at = from + rel;
    if bytes[at] == b'\n' {
        return Split::Found {
            end: at,
            next: at + 1,
        };
    }
    match bytes.get(at + 1) {
        Some(b'\n') => Split::Found {
            end: at,
            next: at + 2,
        },
        Some(_) => Split::Found {
            end: at,
            next: at + 1,
        },
        // `\r` could be the first half of `\r\n`.
        None if !eof => Split::NeedMore { resume_at: at },
        None => Split::Found {
            end: at,
            next: at + 1,
        },
    }
}
