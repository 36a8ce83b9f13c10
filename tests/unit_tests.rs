use spatial_outcome_stats::comparison::rank_results;
use spatial_outcome_stats::distribution::{
    DistanceMatrixComputer, GroundCost, Histogram, HistogramBinner, HistogramConfig,
};
use spatial_outcome_stats::testing::effect::Effect;
use spatial_outcome_stats::testing::inference::nonparametric::kruskal_wallis;
use spatial_outcome_stats::testing::inference::parametric::welch_t_test_from_moments;
use spatial_outcome_stats::testing::{SampleValue, SignificanceTester, TestKind, TestResult};

/// Deterministic pseudo-random values in `[low, high)`.
fn lcg_values(seed: u64, count: usize, low: f64, high: f64) -> Vec<f64> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
            low + unit * (high - low)
        })
        .collect()
}

fn group(prefix: &str, values: &[f64]) -> Vec<SampleValue> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| SampleValue::new(format!("{}{}", prefix, i + 1), v))
        .collect()
}

#[cfg(test)]
mod quick_test {
    use super::*;

    #[test]
    fn check_if_welch_works() {
        // Group 1: [1, 2, 3] -> mean=2, var=1 ; Group 2: [7, 8, 9] -> mean=8, var=1
        let result = welch_t_test_from_moments(2.0, 1.0, 3.0, 8.0, 1.0, 3.0);

        println!("=== WELCH T-TEST RESULTS ===");
        println!("T-statistic: {}", result.statistic);
        println!("P-value: {}", result.p_value);
        println!("Degrees of freedom: {:?}", result.degrees_of_freedom);

        assert!(result.p_value < 0.01, "Expected a small p-value");
        assert!((result.statistic + 7.348469228349534).abs() < 1e-9);
        let df = result.degrees_of_freedom.unwrap();
        assert!((df - 4.0).abs() < 1e-9);
    }

    #[test]
    fn check_identical_means() {
        let result = welch_t_test_from_moments(5.0, 2.0, 4.0, 5.0, 3.0, 6.0);

        println!("\n=== IDENTICAL MEANS TEST ===");
        println!("T-statistic: {}", result.statistic);
        println!("P-value: {}", result.p_value);

        assert!(result.statistic.abs() < 1e-12);
        assert!((result.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn check_constant_groups_give_nan() {
        let result = welch_t_test_from_moments(5.0, 0.0, 3.0, 6.0, 0.0, 3.0);
        assert!(result.statistic.is_nan());
        assert!(result.p_value.is_nan());
    }

    #[test]
    fn check_well_separated_ranks() {
        let low = lcg_values(1, 20, 0.0, 1.0);
        let high = lcg_values(2, 20, 10.0, 11.0);
        let result = kruskal_wallis(&[&low[..], &high[..]]);

        println!("\n=== KRUSKAL-WALLIS SEPARATED GROUPS ===");
        println!("H: {}", result.statistic);
        println!("P-value: {}", result.p_value);

        // Complete separation of 20 vs 20 values: H = 29.268...
        assert!((result.statistic - 29.26829268292683).abs() < 1e-9);
        assert!(result.p_value < 1e-6);
    }
}

#[cfg(test)]
mod properties {
    use super::*;

    #[test]
    fn histogram_mass_sums_to_one_or_zero() {
        let binner = HistogramBinner::new(HistogramConfig::default()).unwrap();
        for seed in 0..25 {
            // about a third of the values fall outside [-0.001, 0.05)
            let values = lcg_values(seed, 40, -0.02, 0.07);
            let histogram = binner.bin(&values);
            let retained = values.iter().any(|&v| (-0.001..0.05).contains(&v));
            let expected = if retained { 1.0 } else { 0.0 };
            assert!(
                (histogram.total() - expected).abs() < 1e-9,
                "seed {}: total {}",
                seed,
                histogram.total()
            );
        }

        let outside = binner.bin(&[0.05, 0.2, -0.5]);
        assert_eq!(outside.total(), 0.0);
        assert!(outside.is_absent());
    }

    #[test]
    fn histogram_is_permutation_invariant() {
        let binner = HistogramBinner::new(HistogramConfig {
            min_value: 0.0,
            max_value: 1.0,
            steps: 17,
        })
        .unwrap();
        let values = lcg_values(42, 101, -0.1, 1.1);
        let mut reversed = values.clone();
        reversed.reverse();
        let mut rotated = values.clone();
        rotated.rotate_left(37);

        let reference = binner.bin(&values);
        assert_eq!(reference, binner.bin(&reversed));
        assert_eq!(reference, binner.bin(&rotated));
    }

    #[test]
    fn distance_matrix_is_symmetric_with_zero_diagonal() {
        let binner = HistogramBinner::new(HistogramConfig::default()).unwrap();
        let histograms: Vec<(String, Histogram)> = (0..8u64)
            .map(|seed| {
                (
                    format!("S{}", 8 - seed),
                    binner.bin(&lcg_values(seed + 100, 30, 0.0, 0.05)),
                )
            })
            .collect();

        for cost in [GroundCost::BinIndex, GroundCost::SquaredBinIndex] {
            let matrix = DistanceMatrixComputer::new(cost)
                .pairwise_distance(&histograms)
                .unwrap();
            assert_eq!(matrix.len(), 8);
            assert_eq!(matrix.sample_identifiers[0], "S1");
            for i in 0..matrix.len() {
                assert_eq!(matrix.values[[i, i]], 0.0);
                for j in 0..matrix.len() {
                    assert_eq!(matrix.values[[i, j]], matrix.values[[j, i]]);
                    assert!(matrix.values[[i, j]] >= 0.0);
                }
            }
        }
    }

    #[test]
    fn zero_variance_groups_are_absent_for_both_kinds() {
        let tester = SignificanceTester::new();
        for level in [0.1, 0.2, 0.3, 0.7] {
            let constant = group("C", &[level, level, level]);
            for seed in 0..10 {
                let varied = group("V", &lcg_values(seed, 5, 0.0, 1.0));
                for kind in TestKind::ALL {
                    assert!(tester.test(&constant, &varied, kind).is_none());
                    assert!(tester.test(&varied, &constant, kind).is_none());
                }
            }
        }
    }

    #[test]
    fn zero_first_summary_gives_undefined_effect() {
        let tester = SignificanceTester::new();
        // mean and median of the first group are both exactly 0.0
        let first = group("A", &[-1.0, 0.0, 1.0]);
        let second = group("B", &[2.0, 3.0, 5.0]);
        for kind in TestKind::ALL {
            let outcome = tester.test(&first, &second, kind).unwrap();
            assert_eq!(outcome.tested_value1, 0.0);
            assert_eq!(outcome.multiplicative_effect, Effect::Undefined);
            assert_eq!(outcome.multiplicative_effect.to_string(), "NaN");
        }
    }

    #[test]
    fn ranking_prefers_significance_then_p_value() {
        let tester = SignificanceTester::new();
        let mut results = Vec::new();
        for (phenotype, shift) in [("weak", 0.5), ("strong", 50.0), ("medium", 2.0)] {
            let first = lcg_values(7, 12, 0.0, 1.0);
            let second: Vec<f64> = lcg_values(8, 12, 0.0, 1.0).iter().map(|v| v + shift).collect();
            let outcome = tester
                .test(&group("A", &first), &group("B", &second), TestKind::TTest)
                .unwrap();
            results.push(TestResult::new("a", "b", phenotype, "tumor", outcome));
        }

        let ranked = rank_results(results);
        assert!(ranked[0].is_significant());
        assert_eq!(ranked[0].phenotype, "strong");
        for pair in ranked.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.is_significant() >= b.is_significant());
            if a.is_significant() == b.is_significant() {
                assert!(a.p_value() <= b.p_value());
            }
        }
    }
}
