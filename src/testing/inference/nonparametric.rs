use crate::testing::inference::InferenceResult;
use crate::testing::utils::rank_with_ties;
use single_utilities::traits::FloatOps;
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Kruskal-Wallis H test across any number of groups.
///
/// Values are ranked jointly with averaged ranks for ties, the statistic is
/// tie-corrected and compared against a chi-squared distribution with
/// `groups - 1` degrees of freedom. Empty groups are ignored; fewer than two
/// non-empty groups, or a pooled sample with a single distinct value, yield NaN.
pub fn kruskal_wallis<T>(groups: &[&[T]]) -> InferenceResult
where
    T: FloatOps,
{
    let groups: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| g.iter().filter_map(|v| v.to_f64()).collect::<Vec<f64>>())
        .filter(|g| !g.is_empty())
        .collect();

    if groups.len() < 2 {
        return InferenceResult::new(f64::NAN, f64::NAN);
    }

    let pooled: Vec<f64> = groups.iter().flatten().copied().collect();
    let n = pooled.len() as f64;
    let (ranks, ties) = rank_with_ties(&pooled);

    let mut offset = 0;
    let mut rank_term = 0.0;
    for group in &groups {
        let rank_sum: f64 = ranks[offset..offset + group.len()].iter().sum();
        rank_term += rank_sum * rank_sum / group.len() as f64;
        offset += group.len();
    }

    let h = 12.0 / (n * (n + 1.0)) * rank_term - 3.0 * (n + 1.0);

    let tie_sum: f64 = ties
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let correction = 1.0 - tie_sum / (n * n * n - n);
    if correction <= 0.0 {
        return InferenceResult::new(f64::NAN, f64::NAN);
    }
    let h = h / correction;

    let df = (groups.len() - 1) as f64;
    let p_value = match ChiSquared::new(df) {
        Ok(chi_dist) => chi_dist.sf(h.max(0.0)),
        Err(_) => f64::NAN,
    };

    InferenceResult::new(h, p_value).with_degrees_of_freedom(df)
}
