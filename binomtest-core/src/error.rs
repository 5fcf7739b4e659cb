//! Structured error types for the binomtest crates.

use thiserror::Error;

/// Unified error type for all binomtest operations.
///
/// Every variant describes a precondition violation by the caller. None of
/// them is transient, so nothing here is worth retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BinomTestError {
    /// A count that must be non-negative was negative.
    #[error("{name} must not be negative, got {value}")]
    NotPositive {
        /// Name of the offending argument.
        name: &'static str,
        /// The value that was passed.
        value: i64,
    },

    /// A real-valued argument fell outside its admissible range (NaN included).
    #[error("{name} = {value} is out of range [{lo}, {hi}]")]
    OutOfRange {
        /// Name of the offending argument.
        name: &'static str,
        /// The value that was passed.
        value: f64,
        /// Lower bound of the admissible range.
        lo: f64,
        /// Upper bound of the admissible range.
        hi: f64,
    },

    /// Arguments are individually valid but inconsistent, or a required
    /// selector is missing.
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// Malformed input to a low-level numerical helper.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience alias used throughout the binomtest crates.
pub type Result<T> = std::result::Result<T, BinomTestError>;
