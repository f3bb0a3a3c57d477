//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when decoding measurement frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A trigger word carried no measurement range; the sample is unusable
    /// and the burst containing it is discarded.
    #[error("measurement range not detected in trigger word {index}")]
    RangeNotDetected {
        /// Zero-based index of the failing word within its burst.
        index: usize,
    },

    /// A trigger word carried the reserved invalid range code.
    #[error("invalid measurement range in trigger word {index}")]
    RangeInvalid {
        /// Zero-based index of the failing word within its burst.
        index: usize,
    },
}

/// Errors that can occur when parsing the device's boot metadata banner.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// The text does not follow the metadata grammar.
    #[error("metadata format mismatch: {0}")]
    FormatMismatch(String),

    /// A numeric field failed to parse.
    #[error("invalid {field} value: {value}")]
    InvalidNumber {
        /// Name of the offending field.
        field: &'static str,
        /// The text that failed to parse.
        value: String,
    },
}
