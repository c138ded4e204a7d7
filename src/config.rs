//! Reader configuration.

use crate::decode::Encoding;
use crate::error::{Error, Result};
use crate::separator::Separator;

/// Bytes requested per refill when no buffer size is configured.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Options accepted by every entry point.
///
/// ```rust
/// use linestream::{Encoding, ReaderConfig};
///
/// let config = ReaderConfig::default()
///     .separator(";")
///     .encoding(Encoding::Utf8)
///     .buffer_size(64);
/// assert!(config.validate().is_ok());
/// ```
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    pub separator: Separator,
    pub encoding: Encoding,
    /// Maximum bytes requested per refill. Small values only cost throughput.
    pub buffer_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            separator: Separator::Auto,
            encoding: Encoding::Utf8,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn separator(mut self, separator: impl Into<Separator>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        self.separator.validate()?;
        if self.buffer_size == 0 {
            return Err(Error::invalid_config("buffer size must be at least 1 byte"));
        }
        Ok(())
    }
}
