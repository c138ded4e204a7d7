use crate::decode::Encoding;
use thiserror::Error;

/// Custom error types for the linestream library.
#[derive(Error, Debug)]
pub enum Error {
    /// The source could not be opened as a stream.
    #[error("failed to open stream: {source}")]
    Open {
        #[source]
        source: std::io::Error,
    },

    /// The underlying stream reported a fault mid-stream.
    #[error("failed to read stream: {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },

    /// Malformed byte sequence that cannot be decoded, even after holding
    /// back incomplete sequences at refill boundaries.
    #[error("invalid {encoding} byte sequence at offset {offset}")]
    Decoding { encoding: Encoding, offset: u64 },

    /// An operation was requested on a reader that is already closed.
    #[error("line reader is closed")]
    Closed,

    /// `next_line` was called with no lines remaining.
    #[error("no more lines")]
    Exhausted,

    /// Closing the underlying stream failed.
    #[error("failed to close stream: {source}")]
    Close {
        #[source]
        source: std::io::Error,
    },

    /// A terminal error whose automatic close also failed.
    #[error("{error} (closing the stream also failed: {close})")]
    CloseAfter {
        #[source]
        error: Box<Error>,
        close: std::io::Error,
    },

    /// Rejected reader configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl Error {
    /// Create a new `InvalidConfig` error with a descriptive message.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Attach a secondary close failure to a terminal error.
    pub fn with_close_failure(self, close: std::io::Error) -> Self {
        Self::CloseAfter {
            error: Box::new(self),
            close,
        }
    }

    /// Terminal errors end the reader's life and close the stream; the others
    /// are local conditions the caller can recover from.
    pub fn is_terminal(&self) -> bool {
        match self {
            Error::Open { .. }
            | Error::Read { .. }
            | Error::Decoding { .. }
            | Error::Close { .. }
            | Error::InvalidConfig { .. } => true,
            Error::CloseAfter { .. } => true,
            Error::Closed | Error::Exhausted => false,
        }
    }

    /// The error that caused termination, looking through `CloseAfter`.
    pub fn primary(&self) -> &Error {
        match self {
            Error::CloseAfter { error, .. } => error.primary(),
            other => other,
        }
    }
}

/// Result type alias for the library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn close_failure_wraps_primary() {
        let read = Error::Read {
            source: io::Error::new(io::ErrorKind::BrokenPipe, "pipe gone"),
        };
        let err = read.with_close_failure(io::Error::new(io::ErrorKind::Other, "close failed"));
        assert!(err.is_terminal());
        assert!(matches!(err.primary(), Error::Read { .. }));
        let msg = err.to_string();
        assert!(msg.contains("pipe gone"));
        assert!(msg.contains("close failed"));
    }

    #[test]
    fn local_errors_are_not_terminal() {
        assert!(!Error::Closed.is_terminal());
        assert!(!Error::Exhausted.is_terminal());
    }

    #[test]
    fn decoding_error_names_encoding() {
        let err = Error::Decoding {
            encoding: Encoding::Utf8,
            offset: 7,
        };
        assert_eq!(err.to_string(), "invalid utf-8 byte sequence at offset 7");
    }
}
