//! Errors raised while turning chat lines into events.

use thiserror::Error;

/// A line matched the grammar but a field could not be converted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The envelope timestamp is not `YYYY-MM-DD HH:MM:SS`.
    #[error("invalid timestamp: {0:?}")]
    Timestamp(String),

    /// A captured field should have been numeric.
    #[error("invalid number for {field}: {value:?}")]
    Number { field: &'static str, value: String },

    /// A rule referenced a capture group its pattern does not have.
    #[error("pattern is missing capture group {0}")]
    MissingCapture(usize),
}
