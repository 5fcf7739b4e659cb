//! Exact binomial hypothesis test.
//!
//! Given `successes` out of `trials` Bernoulli trials, tests the null
//! hypothesis that the success probability equals `probability` against one
//! of three [`Alternative`]s. P-values are exact sums over the binomial
//! distribution; no normal approximation is used.
//!
//! # Example
//!
//! ```
//! use binomtest_stats::testing::{binomial_test_p_value, binomial_test_reject, Alternative};
//!
//! let p = binomial_test_p_value(235, 51, 1.0 / 6.0, Alternative::TwoSided).unwrap();
//! assert!((p - 0.04375).abs() < 1e-4);
//!
//! assert!(binomial_test_reject(235, 51, 1.0 / 6.0, Alternative::TwoSided, 0.05).unwrap());
//! assert!(!binomial_test_reject(235, 51, 1.0 / 6.0, Alternative::TwoSided, 0.01).unwrap());
//! ```

use core::fmt;
use core::str::FromStr;

use binomtest_core::{BinomTestError, Result, Scored, Summarizable};

use crate::distribution::{betai_inv, Binomial};

/// Relative slack under which a mass counts as tied with the observed one in
/// the two-sided sum.
const RELATIVE_TIE_TOLERANCE: f64 = 1e-9;

const METHOD: &str = "Exact binomial test";

// ── Alternative hypothesis ─────────────────────────────────────────────────

/// Which tail(s) of the binomial distribution count as evidence against the
/// null hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Alternative {
    /// Deviation in either direction; point-probability p-value.
    TwoSided,
    /// True success probability is greater than hypothesized: P(X >= k).
    Greater,
    /// True success probability is less than hypothesized: P(X <= k).
    Less,
}

impl Alternative {
    /// Canonical lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TwoSided => "two-sided",
            Self::Greater => "greater",
            Self::Less => "less",
        }
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Alternative {
    type Err = BinomTestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "two-sided" | "two_sided" => Ok(Self::TwoSided),
            "greater" => Ok(Self::Greater),
            "less" => Ok(Self::Less),
            other => Err(BinomTestError::IllegalArgument(format!(
                "unknown alternative hypothesis '{}' (expected two-sided, greater or less)",
                other
            ))),
        }
    }
}

// ── Test result ────────────────────────────────────────────────────────────

/// Result of an exact binomial test.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinomialTestResult {
    /// Number of trials (n).
    pub trials: u64,
    /// Observed successes (k).
    pub successes: u64,
    /// Hypothesized success probability under the null.
    pub probability: f64,
    /// Alternative hypothesis the p-value was computed for.
    pub alternative: Alternative,
    /// The test statistic: the observed number of successes.
    pub statistic: f64,
    /// Observed proportion k / n, or 0 when there were no trials.
    pub estimate: f64,
    /// Exact p-value in `[0, 1]`.
    pub p_value: f64,
    /// Name of the test method.
    pub method: String,
}

impl BinomialTestResult {
    /// Whether the null hypothesis is rejected at significance level `alpha`,
    /// i.e. `p_value < alpha`.
    ///
    /// # Errors
    ///
    /// Returns [`BinomTestError::OutOfRange`] if `alpha` is not in `(0, 1)`.
    pub fn reject(&self, alpha: f64) -> Result<bool> {
        check_significance_level(alpha)?;
        let reject = self.p_value < alpha;
        tracing::debug!(alpha, p_value = self.p_value, reject, "significance decision");
        Ok(reject)
    }

    /// Clopper-Pearson confidence interval for the success probability.
    ///
    /// The interval is one-sided for [`Alternative::Greater`] (upper bound 1)
    /// and [`Alternative::Less`] (lower bound 0), matching the tail of the
    /// test.
    ///
    /// # Errors
    ///
    /// Returns [`BinomTestError::OutOfRange`] if `confidence_level` is not in
    /// `(0, 1)`.
    pub fn proportion_ci(&self, confidence_level: f64) -> Result<(f64, f64)> {
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(BinomTestError::OutOfRange {
                name: "confidence_level",
                value: confidence_level,
                lo: 0.0,
                hi: 1.0,
            });
        }
        let n = self.trials;
        let k = self.successes;
        let tail = match self.alternative {
            Alternative::TwoSided => (1.0 - confidence_level) / 2.0,
            Alternative::Greater | Alternative::Less => 1.0 - confidence_level,
        };

        // Lower bound solves P(X >= k; p) = tail, upper bound P(X <= k; p) = tail.
        let lower = |tail: f64| -> Result<f64> {
            if k == 0 {
                Ok(0.0)
            } else {
                betai_inv(k as f64, (n - k + 1) as f64, tail)
            }
        };
        let upper = |tail: f64| -> Result<f64> {
            if k == n {
                Ok(1.0)
            } else {
                betai_inv((k + 1) as f64, (n - k) as f64, 1.0 - tail)
            }
        };

        match self.alternative {
            Alternative::TwoSided => Ok((lower(tail)?, upper(tail)?)),
            Alternative::Greater => Ok((lower(tail)?, 1.0)),
            Alternative::Less => Ok((0.0, upper(tail)?)),
        }
    }
}

impl Scored for BinomialTestResult {
    fn score(&self) -> f64 {
        self.p_value
    }
}

impl Summarizable for BinomialTestResult {
    fn summary(&self) -> String {
        format!(
            "{}: successes={}/{}, p0={:.4}, alternative={}, estimate={:.4}, p={:.6}",
            self.method,
            self.successes,
            self.trials,
            self.probability,
            self.alternative,
            self.estimate,
            self.p_value,
        )
    }
}

// ── Test configuration ─────────────────────────────────────────────────────

/// Configuration of an exact binomial test.
///
/// The alternative has no default and must be chosen explicitly; evaluating
/// a test without one is an error.
///
/// ```
/// use binomtest_stats::testing::{Alternative, BinomialTest};
///
/// let test = BinomialTest::new(235, 51)
///     .probability(1.0 / 6.0)
///     .alternative(Alternative::Greater);
/// assert!((test.p_value().unwrap() - 0.02654).abs() < 1e-4);
///
/// // No alternative selected.
/// assert!(BinomialTest::new(10, 5).p_value().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinomialTest {
    /// Number of trials.
    pub trials: i64,
    /// Observed successes.
    pub successes: i64,
    /// Hypothesized success probability, 0.5 unless set.
    #[cfg_attr(feature = "serde", serde(default = "default_probability"))]
    pub probability: f64,
    /// Alternative hypothesis.
    #[cfg_attr(feature = "serde", serde(default))]
    pub alternative: Option<Alternative>,
}

#[cfg(feature = "serde")]
fn default_probability() -> f64 {
    0.5
}

impl BinomialTest {
    /// A test of `successes` out of `trials` against p = 0.5, with no
    /// alternative selected yet.
    pub fn new(trials: i64, successes: i64) -> Self {
        Self {
            trials,
            successes,
            probability: 0.5,
            alternative: None,
        }
    }

    /// Set the hypothesized success probability.
    pub fn probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    /// Set the alternative hypothesis.
    pub fn alternative(mut self, alternative: Alternative) -> Self {
        self.alternative = Some(alternative);
        self
    }

    /// Validate the configuration and run the test.
    ///
    /// # Errors
    ///
    /// - [`BinomTestError::NotPositive`] if `trials` or `successes` is negative.
    /// - [`BinomTestError::OutOfRange`] if `probability` is not in `[0, 1]`.
    /// - [`BinomTestError::IllegalArgument`] if `successes > trials` or no
    ///   alternative was selected.
    pub fn run(&self) -> Result<BinomialTestResult> {
        let trials = non_negative("trials", self.trials)?;
        let successes = non_negative("successes", self.successes)?;
        let distribution = Binomial::new(trials, self.probability)?;
        if successes > trials {
            return Err(BinomTestError::IllegalArgument(format!(
                "successes ({}) must not exceed trials ({})",
                successes, trials
            )));
        }
        let alternative = self.alternative.ok_or_else(|| {
            BinomTestError::IllegalArgument("alternative hypothesis must be set".into())
        })?;

        let p_value = match alternative {
            Alternative::Greater => distribution.upper_tail(successes),
            Alternative::Less => distribution.lower_tail(successes),
            Alternative::TwoSided => two_sided_p_value(&distribution, successes),
        };
        tracing::debug!(
            trials,
            successes,
            probability = self.probability,
            alternative = %alternative,
            p_value,
            "binomial test"
        );

        let estimate = if trials == 0 {
            0.0
        } else {
            successes as f64 / trials as f64
        };
        Ok(BinomialTestResult {
            trials,
            successes,
            probability: self.probability,
            alternative,
            statistic: successes as f64,
            estimate,
            p_value,
            method: METHOD.into(),
        })
    }

    /// Exact p-value of the configured test.
    ///
    /// # Errors
    ///
    /// See [`BinomialTest::run`].
    pub fn p_value(&self) -> Result<f64> {
        Ok(self.run()?.p_value)
    }

    /// Whether the null hypothesis is rejected at significance level `alpha`.
    ///
    /// # Errors
    ///
    /// See [`BinomialTest::run`]; additionally
    /// [`BinomTestError::OutOfRange`] if `alpha` is not in `(0, 1)`.
    pub fn reject(&self, alpha: f64) -> Result<bool> {
        check_significance_level(alpha)?;
        self.run()?.reject(alpha)
    }
}

fn non_negative(name: &'static str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| BinomTestError::NotPositive { name, value })
}

/// Sum of the masses of all outcomes no more likely than the observed one.
fn two_sided_p_value(distribution: &Binomial, successes: u64) -> f64 {
    let threshold = distribution.pmf(successes) * (1.0 + RELATIVE_TIE_TOLERANCE);
    let total: f64 = (0..=distribution.trials())
        .map(|i| distribution.pmf(i))
        .filter(|&mass| mass <= threshold)
        .sum();
    if total > 1.0 {
        tracing::trace!(total, "clamping two-sided p-value to 1");
        1.0
    } else {
        total
    }
}

// ── Free functions ─────────────────────────────────────────────────────────

/// Validate a significance level: `alpha` must lie strictly between 0 and 1.
///
/// # Errors
///
/// Returns [`BinomTestError::OutOfRange`] otherwise (NaN included).
pub fn check_significance_level(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(BinomTestError::OutOfRange {
            name: "alpha",
            value: alpha,
            lo: 0.0,
            hi: 1.0,
        })
    }
}

/// Exact binomial test of `successes` out of `trials` against a hypothesized
/// success `probability`.
///
/// # Errors
///
/// See [`BinomialTest::run`].
pub fn binomial_test(
    trials: i64,
    successes: i64,
    probability: f64,
    alternative: Alternative,
) -> Result<BinomialTestResult> {
    BinomialTest::new(trials, successes)
        .probability(probability)
        .alternative(alternative)
        .run()
}

/// Exact binomial test p-value.
///
/// - [`Alternative::Greater`]: P(X >= k)
/// - [`Alternative::Less`]: P(X <= k)
/// - [`Alternative::TwoSided`]: sum of P(X = i) over every i with
///   P(X = i) <= P(X = k), near-ties included
///
/// where X ~ Binomial(trials, probability) and k = `successes`.
///
/// # Errors
///
/// See [`BinomialTest::run`].
pub fn binomial_test_p_value(
    trials: i64,
    successes: i64,
    probability: f64,
    alternative: Alternative,
) -> Result<f64> {
    Ok(binomial_test(trials, successes, probability, alternative)?.p_value)
}

/// Whether the exact binomial test rejects the null hypothesis at
/// significance level `alpha` (`p_value < alpha`).
///
/// # Errors
///
/// See [`BinomialTest::reject`].
pub fn binomial_test_reject(
    trials: i64,
    successes: i64,
    probability: f64,
    alternative: Alternative,
    alpha: f64,
) -> Result<bool> {
    BinomialTest::new(trials, successes)
        .probability(probability)
        .alternative(alternative)
        .reject(alpha)
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-4;
    const TRIALS: i64 = 235;
    const SUCCESSES: i64 = 51;
    const PROBABILITY: f64 = 1.0 / 6.0;

    fn two_sided(n: i64, k: i64, p: f64) -> f64 {
        binomial_test_p_value(n, k, p, Alternative::TwoSided).unwrap()
    }

    #[test]
    fn p_values_dice_example() {
        let p = binomial_test_p_value(TRIALS, SUCCESSES, PROBABILITY, Alternative::TwoSided)
            .unwrap();
        assert!((p - 0.04375).abs() < TOL, "p={}", p);
        let p = binomial_test_p_value(TRIALS, SUCCESSES, PROBABILITY, Alternative::Greater)
            .unwrap();
        assert!((p - 0.02654).abs() < TOL, "p={}", p);
        let p = binomial_test_p_value(TRIALS, SUCCESSES, PROBABILITY, Alternative::Less).unwrap();
        assert!((p - 0.982).abs() < TOL, "p={}", p);
    }

    #[test]
    fn two_sided_all_successes() {
        let cases = [
            (1.0, 1.0),
            (0.9, 1.0),
            (0.8, 1.0),
            (0.7, 0.559),
            (0.6, 0.28),
            (0.5, 0.25),
            (0.4, 0.064),
            (0.3, 0.027),
            (0.2, 0.008),
            (0.1, 0.001),
            (0.0, 0.0),
        ];
        for &(p, expected) in &cases {
            let got = two_sided(3, 3, p);
            assert!((got - expected).abs() < TOL, "p={} got={} expected={}", p, got, expected);
        }
    }

    #[test]
    fn two_sided_no_successes() {
        let cases = [
            (1.0, 0.0),
            (0.9, 0.001),
            (0.8, 0.008),
            (0.7, 0.027),
            (0.6, 0.064),
            (0.5, 0.25),
            (0.4, 0.28),
            (0.3, 0.559),
            (0.2, 1.0),
            (0.1, 1.0),
            (0.0, 1.0),
        ];
        for &(p, expected) in &cases {
            let got = two_sided(3, 0, p);
            assert!((got - expected).abs() < TOL, "p={} got={} expected={}", p, got, expected);
        }
    }

    #[test]
    fn certain_event() {
        for n in [0, 1, 7, 100] {
            assert!((two_sided(n, n, 1.0) - 1.0).abs() < 1e-12, "n={}", n);
        }
    }

    #[test]
    fn impossible_event() {
        for n in [1, 7, 100] {
            assert_eq!(two_sided(n, 0, 1.0), 0.0, "n={}", n);
        }
    }

    #[test]
    fn zero_trials() {
        for alternative in [Alternative::TwoSided, Alternative::Greater, Alternative::Less] {
            let p = binomial_test_p_value(0, 0, 0.3, alternative).unwrap();
            assert!((p - 1.0).abs() < 1e-12, "{} p={}", alternative, p);
        }
    }

    #[test]
    fn greater_edge_cases() {
        assert_eq!(binomial_test_p_value(10, 0, 0.3, Alternative::Greater).unwrap(), 1.0);
        assert_eq!(binomial_test_p_value(10, 4, 0.0, Alternative::Greater).unwrap(), 0.0);
        assert_eq!(binomial_test_p_value(10, 4, 1.0, Alternative::Greater).unwrap(), 1.0);
    }

    #[test]
    fn less_edge_cases() {
        assert_eq!(binomial_test_p_value(10, 10, 0.3, Alternative::Less).unwrap(), 1.0);
        assert_eq!(binomial_test_p_value(10, 4, 1.0, Alternative::Less).unwrap(), 0.0);
        assert_eq!(binomial_test_p_value(10, 4, 0.0, Alternative::Less).unwrap(), 1.0);
    }

    #[test]
    fn symmetric_two_sided_never_exceeds_one() {
        let p = two_sided(10, 5, 0.5);
        assert!(p <= 1.0, "p={}", p);
        assert!((p - 1.0).abs() < 1e-9, "p={}", p);
    }

    #[test]
    fn two_sided_includes_symmetric_ties() {
        // Under p = 0.5, P(X=2) == P(X=8) for n = 10; both tails count.
        let expected = (1.0 + 10.0 + 45.0) * 2.0 / 1024.0;
        assert!((two_sided(10, 2, 0.5) - expected).abs() < 1e-9);
        assert!((two_sided(10, 8, 0.5) - expected).abs() < 1e-9);
    }

    #[test]
    fn accept_reject() {
        let reject = |alternative, alpha| {
            binomial_test_reject(TRIALS, SUCCESSES, PROBABILITY, alternative, alpha).unwrap()
        };
        assert!(reject(Alternative::TwoSided, 0.05));
        assert!(reject(Alternative::Greater, 0.05));
        assert!(!reject(Alternative::Less, 0.05));

        assert!(!reject(Alternative::TwoSided, 0.01));
        assert!(!reject(Alternative::Greater, 0.01));
        assert!(!reject(Alternative::Less, 0.01));
    }

    #[test]
    fn negative_successes_not_positive() {
        let err = binomial_test_p_value(10, -1, 0.5, Alternative::TwoSided).unwrap_err();
        assert!(matches!(
            err,
            BinomTestError::NotPositive { name: "successes", value: -1 }
        ));
    }

    #[test]
    fn negative_trials_not_positive() {
        let err = binomial_test_p_value(-3, 0, 0.5, Alternative::TwoSided).unwrap_err();
        assert!(matches!(err, BinomTestError::NotPositive { name: "trials", .. }));
    }

    #[test]
    fn successes_exceed_trials() {
        let err = binomial_test_p_value(10, 11, 0.5, Alternative::TwoSided).unwrap_err();
        assert!(matches!(err, BinomTestError::IllegalArgument(_)));
    }

    #[test]
    fn missing_alternative() {
        let err = BinomialTest::new(10, 11).probability(0.5).p_value().unwrap_err();
        assert!(matches!(err, BinomTestError::IllegalArgument(_)));

        let err = BinomialTest::new(10, 5).run().unwrap_err();
        assert!(matches!(err, BinomTestError::IllegalArgument(_)));
    }

    #[test]
    fn probability_out_of_range() {
        for p in [-0.01, 1.01, f64::NAN] {
            let err = binomial_test_p_value(10, 5, p, Alternative::Less).unwrap_err();
            assert!(matches!(err, BinomTestError::OutOfRange { name: "probability", .. }));
        }
    }

    #[test]
    fn alpha_out_of_range() {
        for alpha in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let err = binomial_test_reject(10, 5, 0.5, Alternative::TwoSided, alpha).unwrap_err();
            assert!(matches!(err, BinomTestError::OutOfRange { name: "alpha", .. }));
        }
        assert!(check_significance_level(0.05).is_ok());
    }

    #[test]
    fn alternative_parse_and_display() {
        assert_eq!("two-sided".parse::<Alternative>().unwrap(), Alternative::TwoSided);
        assert_eq!("TWO_SIDED".parse::<Alternative>().unwrap(), Alternative::TwoSided);
        assert_eq!(" greater ".parse::<Alternative>().unwrap(), Alternative::Greater);
        assert_eq!("Less".parse::<Alternative>().unwrap(), Alternative::Less);
        assert!(matches!(
            "both".parse::<Alternative>(),
            Err(BinomTestError::IllegalArgument(_))
        ));
        assert_eq!(Alternative::TwoSided.to_string(), "two-sided");
    }

    #[test]
    fn result_fields() {
        let result = binomial_test(TRIALS, SUCCESSES, PROBABILITY, Alternative::TwoSided).unwrap();
        assert_eq!(result.trials, 235);
        assert_eq!(result.successes, 51);
        assert_eq!(result.statistic, 51.0);
        assert!((result.estimate - 51.0 / 235.0).abs() < 1e-12);
        assert!((result.score() - result.p_value).abs() < 1e-15);
    }

    #[test]
    fn result_summary() {
        let s = binomial_test(10, 7, 0.5, Alternative::Greater).unwrap().summary();
        assert!(s.contains("Exact binomial test"));
        assert!(s.contains("successes=7/10"));
        assert!(s.contains("alternative=greater"));
        assert!(s.contains("p="));
    }

    #[test]
    fn zero_trials_estimate() {
        let result = binomial_test(0, 0, 0.5, Alternative::Less).unwrap();
        assert_eq!(result.estimate, 0.0);
    }

    // ── Clopper-Pearson interval ───────────────────────────────────────

    #[test]
    fn proportion_ci_two_sided_known() {
        let result = binomial_test(10, 5, 0.5, Alternative::TwoSided).unwrap();
        let (lo, hi) = result.proportion_ci(0.95).unwrap();
        assert!((lo - 0.187086).abs() < 1e-5, "lo={}", lo);
        assert!((hi - 0.812914).abs() < 1e-5, "hi={}", hi);
    }

    #[test]
    fn proportion_ci_zero_successes() {
        // Upper bound has the closed form 1 - (alpha/2)^(1/n).
        let result = binomial_test(10, 0, 0.5, Alternative::TwoSided).unwrap();
        let (lo, hi) = result.proportion_ci(0.95).unwrap();
        assert_eq!(lo, 0.0);
        let expected = 1.0 - 0.025_f64.powf(0.1);
        assert!((hi - expected).abs() < 1e-8, "hi={} expected={}", hi, expected);
    }

    #[test]
    fn proportion_ci_all_successes() {
        let result = binomial_test(10, 10, 0.5, Alternative::TwoSided).unwrap();
        let (lo, hi) = result.proportion_ci(0.95).unwrap();
        assert!((lo - 0.025_f64.powf(0.1)).abs() < 1e-8, "lo={}", lo);
        assert_eq!(hi, 1.0);
    }

    #[test]
    fn proportion_ci_one_sided() {
        let greater = binomial_test(20, 12, 0.5, Alternative::Greater).unwrap();
        let (lo, hi) = greater.proportion_ci(0.95).unwrap();
        assert_eq!(hi, 1.0);
        assert!(lo > 0.0 && lo < 0.6);

        let less = binomial_test(20, 12, 0.5, Alternative::Less).unwrap();
        let (lo, hi) = less.proportion_ci(0.95).unwrap();
        assert_eq!(lo, 0.0);
        assert!(hi > 0.6 && hi < 1.0);
    }

    #[test]
    fn proportion_ci_contains_estimate() {
        let result = binomial_test(TRIALS, SUCCESSES, PROBABILITY, Alternative::TwoSided).unwrap();
        let (lo, hi) = result.proportion_ci(0.99).unwrap();
        assert!(lo < result.estimate && result.estimate < hi);
    }

    #[test]
    fn proportion_ci_zero_trials() {
        let result = binomial_test(0, 0, 0.5, Alternative::TwoSided).unwrap();
        assert_eq!(result.proportion_ci(0.95).unwrap(), (0.0, 1.0));
    }

    #[test]
    fn proportion_ci_invalid_level() {
        let result = binomial_test(10, 5, 0.5, Alternative::TwoSided).unwrap();
        assert!(result.proportion_ci(0.0).is_err());
        assert!(result.proportion_ci(1.0).is_err());
    }
}
