//! Two-sample t-tests per grid point
//!
//! Samples carry the sample axis (years, ensemble members) first; every
//! remaining index is an independent grid point tested in parallel.

use crate::errors::{ClimVisError, Result};
use ndarray::{ArrayD, ArrayView1, Axis, IxDyn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::fmt;
use std::str::FromStr;

/// Points with a p-value above this are masked as insignificant
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.1;

/// Which two-sample t-test to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    /// Matched pairs, equal sample sizes
    #[default]
    Paired,
    /// Independent samples, unequal variances
    Welch,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paired => write!(f, "paired"),
            Self::Welch => write!(f, "welch"),
        }
    }
}

impl FromStr for TestKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "paired" | "rel" => Ok(Self::Paired),
            "welch" | "ind" | "unpaired" => Ok(Self::Welch),
            other => Err(format!("Unknown test kind '{other}', expected paired or welch")),
        }
    }
}

/// Statistic and two-sided p-value of one test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTest {
    pub t: f64,
    pub p: f64,
}

impl TTest {
    const UNDEFINED: Self = Self { t: f64::NAN, p: f64::NAN };

    fn from_moments(mean_diff: f64, std_err: f64, df: f64) -> Result<Self> {
        if std_err == 0.0 {
            // zero spread in both samples
            return Ok(if mean_diff == 0.0 {
                Self { t: 0.0, p: 1.0 }
            } else {
                Self { t: mean_diff.signum() * f64::INFINITY, p: 0.0 }
            });
        }
        let t = mean_diff / std_err;
        let dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|e| ClimVisError::StatisticsError(format!("t distribution with {df} dof: {e}")))?;
        let p = (2.0 * dist.cdf(-t.abs())).min(1.0);
        Ok(Self { t, p })
    }
}

fn has_missing(lane: &ArrayView1<f64>) -> bool {
    lane.iter().any(|v| !v.is_finite())
}

/// Matched-pairs t-test of `a - b`. Missing values make the result NaN.
///
/// # Errors
///
/// Returns `SampleSizeMismatch` unless both samples have the same length of
/// at least two.
pub fn paired_t_test(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Result<TTest> {
    if a.len() != b.len() || a.len() < 2 {
        return Err(ClimVisError::SampleSizeMismatch {
            message: format!("paired test needs equal samples of at least 2, got {} and {}", a.len(), b.len()),
        });
    }
    if has_missing(&a) || has_missing(&b) {
        return Ok(TTest::UNDEFINED);
    }
    let d = &a - &b;
    let n = d.len() as f64;
    let mean = d.sum() / n;
    let var = d.var(1.0);
    TTest::from_moments(mean, (var / n).sqrt(), n - 1.0)
}

/// Welch's unequal-variance t-test. Missing values make the result NaN.
///
/// # Errors
///
/// Returns `SampleSizeMismatch` if either sample has fewer than two values.
pub fn welch_t_test(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Result<TTest> {
    if a.len() < 2 || b.len() < 2 {
        return Err(ClimVisError::SampleSizeMismatch {
            message: format!("Welch test needs at least 2 values per sample, got {} and {}", a.len(), b.len()),
        });
    }
    if has_missing(&a) || has_missing(&b) {
        return Ok(TTest::UNDEFINED);
    }
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let va = a.var(1.0) / na;
    let vb = b.var(1.0) / nb;
    let mean_diff = a.sum() / na - b.sum() / nb;
    let df = (va + vb).powi(2) / (va.powi(2) / (na - 1.0) + vb.powi(2) / (nb - 1.0));
    TTest::from_moments(mean_diff, (va + vb).sqrt(), df)
}

/// Output of [`significance_test`], all on the spatial grid
#[derive(Debug, Clone)]
pub struct SignificanceResult {
    /// `timemean1 - timemean2`
    pub difference: ArrayD<f64>,
    /// `difference` with masked points set to NaN
    pub masked_difference: ArrayD<f64>,
    /// `true` where the difference is not significant
    pub mask: ArrayD<bool>,
    pub t_statistic: ArrayD<f64>,
    pub p_value: ArrayD<f64>,
    pub level: f64,
}

impl SignificanceResult {
    /// Number of grid points that pass the test
    #[must_use]
    pub fn significant_count(&self) -> usize {
        self.mask.iter().filter(|m| !**m).count()
    }
}

/// Test whether two samples differ at each grid point and mask the
/// difference of their time means where they do not.
///
/// Points with `p > level` or an undefined p-value are masked.
///
/// # Errors
///
/// Returns `SampleSizeMismatch` when spatial shapes disagree, a sample has
/// fewer than two entries, or a paired test gets unequal sample sizes, and
/// `InvalidConfig` for a level outside `(0, 1)`.
pub fn significance_test(
    sample1: &ArrayD<f64>,
    sample2: &ArrayD<f64>,
    timemean1: &ArrayD<f64>,
    timemean2: &ArrayD<f64>,
    kind: TestKind,
    level: f64,
) -> Result<SignificanceResult> {
    if !(level > 0.0 && level < 1.0) {
        return Err(ClimVisError::InvalidConfig {
            message: format!("significance level {level} outside (0, 1)"),
        });
    }
    if sample1.ndim() == 0 || sample2.ndim() == 0 {
        return Err(ClimVisError::SampleSizeMismatch {
            message: "samples need a leading sample axis".to_string(),
        });
    }
    let spatial = &sample1.shape()[1..];
    if &sample2.shape()[1..] != spatial || timemean1.shape() != spatial || timemean2.shape() != spatial {
        return Err(ClimVisError::SampleSizeMismatch {
            message: format!(
                "grid shapes differ: samples {:?} and {:?}, means {:?} and {:?}",
                sample1.shape(),
                sample2.shape(),
                timemean1.shape(),
                timemean2.shape()
            ),
        });
    }
    let (n1, n2) = (sample1.len_of(Axis(0)), sample2.len_of(Axis(0)));
    if n1 < 2 || n2 < 2 || (kind == TestKind::Paired && n1 != n2) {
        return Err(ClimVisError::SampleSizeMismatch {
            message: format!("{kind} test cannot compare {n1} and {n2} samples"),
        });
    }

    let lanes1: Vec<ArrayView1<f64>> = sample1.lanes(Axis(0)).into_iter().collect();
    let lanes2: Vec<ArrayView1<f64>> = sample2.lanes(Axis(0)).into_iter().collect();
    let tests: Vec<TTest> = lanes1
        .par_iter()
        .zip(lanes2.par_iter())
        .map(|(a, b)| match kind {
            TestKind::Paired => paired_t_test(a.view(), b.view()),
            TestKind::Welch => welch_t_test(a.view(), b.view()),
        })
        .collect::<Result<_>>()?;

    let shape = IxDyn(spatial);
    let t_statistic = ArrayD::from_shape_vec(shape.clone(), tests.iter().map(|t| t.t).collect())?;
    let p_value = ArrayD::from_shape_vec(shape, tests.iter().map(|t| t.p).collect())?;
    let mask = p_value.mapv(|p| p.is_nan() || p > level);
    let difference = timemean1 - timemean2;
    let mut masked_difference = difference.clone();
    masked_difference.zip_mut_with(&mask, |d, &m| {
        if m {
            *d = f64::NAN;
        }
    });

    let result = SignificanceResult {
        difference,
        masked_difference,
        mask,
        t_statistic,
        p_value,
        level,
    };
    tracing::info!(
        %kind,
        level,
        points = tests.len(),
        significant = result.significant_count(),
        "significance test"
    );
    Ok(result)
}
