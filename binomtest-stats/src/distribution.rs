//! Probability distributions and numerical helpers.
//!
//! Provides the [`Distribution`] trait, the [`Binomial`] distribution, and the
//! low-level functions ([`ln_gamma`], [`betai`], [`betai_inv`]) that the exact
//! binomial test is built on.

use core::f64::consts::PI;

use binomtest_core::{BinomTestError, Result};

use crate::combinatorics::ln_choose;

// ── Numerical helpers ──────────────────────────────────────────────────────

/// Natural log of the gamma function via the Lanczos approximation (g=7).
pub fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 8] = [
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];

    if x < 0.5 {
        // Reflection formula: Γ(x) = π / (sin(πx) · Γ(1-x))
        let log_pi_over_sin = (PI / (PI * x).sin()).ln();
        log_pi_over_sin - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let mut ag = 0.99999999999980993_f64;
        for (i, &c) in COEFFS.iter().enumerate() {
            ag += c / (x + i as f64 + 1.0);
        }
        let t = x + 7.5; // g + 0.5
        0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + ag.ln()
    }
}

/// Regularized incomplete beta function I_x(a, b) via continued fraction
/// (modified Lentz's method, max 300 iterations).
///
/// Binomial tails reduce to this function: P(X >= k) = I_p(k, n - k + 1).
///
/// # Errors
///
/// Returns an error if `x` is not in `[0, 1]` or if `a` or `b` is not positive.
pub fn betai(a: f64, b: f64, x: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&x) {
        return Err(BinomTestError::InvalidInput(
            "betai: x must be in [0, 1]".into(),
        ));
    }
    if !(a > 0.0 && b > 0.0) {
        return Err(BinomTestError::InvalidInput(
            "betai: a and b must be positive".into(),
        ));
    }
    if x == 0.0 || x == 1.0 {
        return Ok(x);
    }

    // Use symmetry relation for numerical stability.
    if x > (a + 1.0) / (a + b + 2.0) {
        return Ok(1.0 - betai(b, a, 1.0 - x)?);
    }

    let ln_prefactor = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b)
        + a * x.ln()
        + b * (1.0 - x).ln();
    let prefactor = ln_prefactor.exp();

    // Evaluate continued fraction with modified Lentz's method.
    let tiny = 1e-30_f64;
    let eps = 1e-14_f64;
    let max_iter = 300;

    let mut c = 1.0_f64;
    let mut d = 1.0 - (a + b) * x / (a + 1.0);
    if d.abs() < tiny {
        d = tiny;
    }
    d = d.recip();
    let mut h = d;

    for m in 1..=max_iter {
        let m_f64 = m as f64;

        // Even step: d_{2m}
        let num_even = m_f64 * (b - m_f64) * x / ((a + 2.0 * m_f64 - 1.0) * (a + 2.0 * m_f64));
        d = 1.0 + num_even * d;
        if d.abs() < tiny {
            d = tiny;
        }
        d = d.recip();
        c = 1.0 + num_even / c;
        if c.abs() < tiny {
            c = tiny;
        }
        h *= d * c;

        // Odd step: d_{2m+1}
        let num_odd = -((a + m_f64) * (a + b + m_f64) * x)
            / ((a + 2.0 * m_f64) * (a + 2.0 * m_f64 + 1.0));
        d = 1.0 + num_odd * d;
        if d.abs() < tiny {
            d = tiny;
        }
        d = d.recip();
        c = 1.0 + num_odd / c;
        if c.abs() < tiny {
            c = tiny;
        }
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < eps {
            break;
        }
    }

    Ok((prefactor * h / a).clamp(0.0, 1.0))
}

/// Inverse of the regularized incomplete beta function: the `x` in `[0, 1]`
/// with I_x(a, b) = `target`, found by bisection.
///
/// # Errors
///
/// Returns an error if `target` is not in `[0, 1]` or if `a` or `b` is not
/// positive.
pub fn betai_inv(a: f64, b: f64, target: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&target) {
        return Err(BinomTestError::InvalidInput(
            "betai_inv: target must be in [0, 1]".into(),
        ));
    }
    if target == 0.0 || target == 1.0 {
        return Ok(target);
    }

    // I_x(a, b) is monotonically increasing in x.
    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if betai(a, b, mid)? < target {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-15 {
            break;
        }
    }
    Ok(0.5 * (lo + hi))
}

/// `x · ln(y)` with the convention `0 · ln(0) = 0`, so that `0^0 = 1` holds
/// when exponentiated.
fn x_ln_y(x: u64, y: f64) -> f64 {
    if x == 0 {
        0.0
    } else {
        x as f64 * y.ln()
    }
}

// ── Distribution trait ─────────────────────────────────────────────────────

/// A probability distribution with basic statistical properties.
pub trait Distribution {
    /// Probability density (or mass) function at `x`.
    fn pdf(&self, x: f64) -> f64;

    /// Cumulative distribution function at `x`.
    fn cdf(&self, x: f64) -> f64;

    /// Distribution mean.
    fn mean(&self) -> f64;

    /// Distribution variance.
    fn variance(&self) -> f64;

    /// Distribution standard deviation (default: sqrt of variance).
    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

// ── Binomial distribution ─────────────────────────────────────────────────

/// Binomial distribution with parameters n (trials) and p (success probability).
///
/// The degenerate cases `p = 0` and `p = 1` are ordinary members of the
/// family: all mass sits at 0 or at `n` respectively.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binomial {
    n: u64,
    p: f64,
}

impl Binomial {
    /// Create a binomial distribution.
    ///
    /// # Errors
    ///
    /// Returns [`BinomTestError::OutOfRange`] if `p` is not in `[0, 1]`.
    pub fn new(n: u64, p: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(BinomTestError::OutOfRange {
                name: "probability",
                value: p,
                lo: 0.0,
                hi: 1.0,
            });
        }
        Ok(Self { n, p })
    }

    /// Number of trials.
    pub fn trials(&self) -> u64 {
        self.n
    }

    /// Success probability.
    pub fn prob(&self) -> f64 {
        self.p
    }

    /// Log of the probability mass, ln P(X = k). Negative infinity when the
    /// outcome is impossible.
    pub fn ln_pmf(&self, k: u64) -> f64 {
        if k > self.n {
            return f64::NEG_INFINITY;
        }
        ln_choose(self.n, k) + x_ln_y(k, self.p) + x_ln_y(self.n - k, 1.0 - self.p)
    }

    /// Probability mass function P(X = k).
    pub fn pmf(&self, k: u64) -> f64 {
        self.ln_pmf(k).exp()
    }

    /// Lower tail P(X <= k).
    pub fn lower_tail(&self, k: u64) -> f64 {
        if k >= self.n {
            return 1.0;
        }
        // P(X <= k) = I_{1-p}(n-k, k+1)
        betai((self.n - k) as f64, (k + 1) as f64, 1.0 - self.p).unwrap_or(1.0)
    }

    /// Upper tail P(X >= k).
    pub fn upper_tail(&self, k: u64) -> f64 {
        if k == 0 {
            return 1.0;
        }
        if k > self.n {
            return 0.0;
        }
        // P(X >= k) = I_p(k, n-k+1)
        betai(k as f64, (self.n - k + 1) as f64, self.p).unwrap_or(0.0)
    }
}

impl Distribution for Binomial {
    fn pdf(&self, x: f64) -> f64 {
        let k = x.round() as i64;
        if k < 0 || (x - k as f64).abs() > 1e-9 {
            return 0.0;
        }
        self.pmf(k as u64)
    }

    fn cdf(&self, x: f64) -> f64 {
        let k_max = x.floor() as i64;
        if k_max < 0 {
            return 0.0;
        }
        self.lower_tail(k_max as u64)
    }

    fn mean(&self) -> f64 {
        self.n as f64 * self.p
    }

    fn variance(&self) -> f64 {
        self.n as f64 * self.p * (1.0 - self.p)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
