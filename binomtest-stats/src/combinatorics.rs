//! Binomial coefficients, exact and in log space.

use binomtest_core::{BinomTestError, Result};

use crate::distribution::ln_gamma;

/// Log-factorial via `ln(Γ(n + 1))`.
pub fn ln_factorial(n: u64) -> f64 {
    if n < 2 {
        return 0.0;
    }
    ln_gamma(n as f64 + 1.0)
}

/// Exact binomial coefficient C(n, k). Returns `None` on overflow.
pub fn binomial(n: u64, k: u64) -> Option<u64> {
    if k > n {
        return Some(0);
    }
    // Use the smaller of k and n-k for efficiency
    let k = k.min(n - k);
    let mut result = 1u64;
    for i in 0..k {
        result = result.checked_mul(n - i)?;
        result /= i + 1;
    }
    Some(result)
}

/// Log-space binomial coefficient ln(C(n, k)).
///
/// # Errors
///
/// Returns an error if `k > n`.
pub fn ln_binomial(n: u64, k: u64) -> Result<f64> {
    if k > n {
        return Err(BinomTestError::InvalidInput(
            "ln_binomial: k must be <= n".into(),
        ));
    }
    Ok(ln_choose(n, k))
}

/// ln(C(n, k)), negative infinity when `k > n`. Exactly zero at the edges so
/// that certain outcomes keep a mass of exactly 1.
pub(crate) fn ln_choose(n: u64, k: u64) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    if k == 0 || k == n {
        return 0.0;
    }
    ln_factorial(n) - ln_factorial(k) - ln_factorial(n - k)
}
