//! Error types raised while decoding mount specifications.
//!
//! Text and argument decoding is strict and reports the offending input.
//! Wire decoding only fails on top-level container mismatches; malformed
//! individual entries are skipped by the decoder and never surface here.

use thiserror::Error;

/// Errors produced by the mount specification codecs.
#[derive(Debug, Error)]
pub enum SpecError {
    /// A text-encoded pair did not split into exactly one key and one value.
    #[error("Encountered invalid key/value pair '{pair}' while decoding mount spec")]
    InvalidPair { pair: String },

    /// The text encoding carried no `__mount_prefix` entry.
    #[error("Didn't find __mount_prefix while decoding '{input}' mount spec")]
    MissingPrefix { input: String },

    /// A percent-escaped token did not decode to UTF-8, or held a NUL byte.
    #[error("Invalid escape sequence in '{token}' while decoding mount spec")]
    InvalidEscape { token: String },

    /// The structured message did not have the expected container layout.
    #[error("Malformed mount spec message: {0}")]
    MalformedMessage(&'static str),

    /// Daemon arguments were not of the `key=value` form.
    #[error("Usage: {0}")]
    Usage(String),

    /// Neither a default type nor a `type=` argument was supplied.
    #[error("No mount type specified")]
    MissingType,

    /// Low-level message read failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SpecError {
    /// Returns `true` for errors caused by malformed caller input, the
    /// generic "invalid argument" kind of the I/O error domain.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            SpecError::InvalidPair { .. }
                | SpecError::MissingPrefix { .. }
                | SpecError::InvalidEscape { .. }
                | SpecError::Usage(_)
                | SpecError::MissingType
        )
    }
}
