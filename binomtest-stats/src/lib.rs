//! Exact binomial hypothesis testing.
//!
//! - **Hypothesis testing**: exact binomial test with two-sided, greater and
//!   less alternatives, significance decisions, Clopper-Pearson intervals
//! - **Distributions**: the binomial distribution and its exact tails
//! - **Combinatorics**: binomial coefficients, exact and in log space

pub mod combinatorics;
pub mod distribution;
pub mod testing;

pub use testing::{
    binomial_test, binomial_test_p_value, binomial_test_reject, check_significance_level,
    Alternative, BinomialTest, BinomialTestResult,
};
