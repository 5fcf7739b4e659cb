//! Shared primitives for the binomtest crates.
//!
//! - **Error types**: [`BinomTestError`] and [`Result`] for structured error handling
//! - **Traits**: [`Scored`] and [`Summarizable`] for test results

pub mod error;
pub mod traits;

pub use error::{BinomTestError, Result};
pub use traits::*;
