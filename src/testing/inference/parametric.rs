//! Parametric comparison of two sample groups.

use crate::testing::inference::InferenceResult;
use crate::testing::utils::{mean, sample_variance};
use single_utilities::traits::FloatOps;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Welch's t-test (unequal variances) comparing `x` against `y`.
///
/// The statistic is oriented as `mean(x) - mean(y)`; the p-value is two-sided and
/// uses the Welch-Satterthwaite degrees of freedom. Groups with fewer than two
/// values, or two constant groups, give NaN for both statistic and p-value.
pub fn welch_t_test<T>(x: &[T], y: &[T]) -> InferenceResult
where
    T: FloatOps,
{
    let x: Vec<f64> = x.iter().filter_map(|v| v.to_f64()).collect();
    let y: Vec<f64> = y.iter().filter_map(|v| v.to_f64()).collect();

    if x.len() < 2 || y.len() < 2 {
        return InferenceResult::new(f64::NAN, f64::NAN);
    }

    welch_t_test_from_moments(
        mean(&x),
        sample_variance(&x),
        x.len() as f64,
        mean(&y),
        sample_variance(&y),
        y.len() as f64,
    )
}

/// Welch's t-test from per-group mean, sample variance and size.
pub fn welch_t_test_from_moments(
    mean1: f64,
    var1: f64,
    n1: f64,
    mean2: f64,
    var2: f64,
    n2: f64,
) -> InferenceResult {
    if n1 < 2.0 || n2 < 2.0 {
        return InferenceResult::new(f64::NAN, f64::NAN);
    }

    let term1 = var1 / n1;
    let term2 = var2 / n2;
    let combined_var = term1 + term2;
    if !(combined_var > 0.0) {
        return InferenceResult::new(f64::NAN, f64::NAN);
    }

    let t_stat = (mean1 - mean2) / combined_var.sqrt();

    // Welch-Satterthwaite equation for degrees of freedom
    let df = combined_var * combined_var
        / (term1 * term1 / (n1 - 1.0) + term2 * term2 / (n2 - 1.0));

    InferenceResult::new(t_stat, t_test_p_value(t_stat, df)).with_degrees_of_freedom(df)
}

#[inline]
fn t_test_p_value(t_stat: f64, df: f64) -> f64 {
    if t_stat.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if t_stat.is_infinite() {
        return 0.0;
    }

    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => (2.0 * t_dist.sf(t_stat.abs())).min(1.0),
        Err(_) => f64::NAN,
    }
}
