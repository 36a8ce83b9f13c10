use crate::testing::TestResult;
use std::cmp::Ordering;

/// Export order: outcome pair, significant rows first, then ascending p-value.
///
/// Rows equal on every key keep their relative input order.
pub fn compare_for_export(a: &TestResult, b: &TestResult) -> Ordering {
    a.outcome1
        .cmp(&b.outcome1)
        .then_with(|| a.outcome2.cmp(&b.outcome2))
        .then_with(|| b.is_significant().cmp(&a.is_significant()))
        .then_with(|| a.p_value().total_cmp(&b.p_value()))
}

pub fn rank_results(mut results: Vec<TestResult>) -> Vec<TestResult> {
    // stable, so insertion order settles remaining ties
    results.sort_by(compare_for_export);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::effect::{Effect, Extremum};
    use crate::testing::{SIGNIFICANCE_THRESHOLD, TestKind, TestOutcome};

    fn row(outcome1: &str, outcome2: &str, phenotype: &str, p_value: f64) -> TestResult {
        TestResult::new(
            outcome1,
            outcome2,
            phenotype,
            "tumor",
            TestOutcome {
                kind: TestKind::TTest,
                tested_value1: 1.0,
                tested_value2: 2.0,
                statistic: 0.0,
                p_value,
                absolute_effect: 1.0,
                multiplicative_effect: Effect::Numeric(2.0),
                effect_sign: 1,
                significant: p_value < SIGNIFICANCE_THRESHOLD,
                extreme1: Extremum::none(),
                extreme2: Extremum::none(),
            },
        )
    }

    fn phenotypes(rows: &[TestResult]) -> Vec<&str> {
        rows.iter().map(|r| r.phenotype.as_str()).collect()
    }

    #[test]
    fn test_significant_rows_first_within_pair() {
        let ranked = rank_results(vec![
            row("a", "b", "p1", 0.2),
            row("a", "b", "p2", 0.009),
            row("a", "b", "p3", 0.05),
            row("a", "b", "p4", 0.0001),
        ]);
        assert_eq!(phenotypes(&ranked), vec!["p4", "p2", "p3", "p1"]);
    }

    #[test]
    fn test_pairs_sort_before_significance() {
        let ranked = rank_results(vec![
            row("b", "c", "p1", 0.0001),
            row("a", "c", "p2", 0.5),
            row("a", "b", "p3", 0.9),
            row("a", "c", "p4", 0.001),
        ]);
        assert_eq!(phenotypes(&ranked), vec!["p3", "p4", "p2", "p1"]);
    }

    #[test]
    fn test_full_ties_keep_insertion_order() {
        let ranked = rank_results(vec![
            row("a", "b", "first", 0.3),
            row("a", "b", "second", 0.3),
            row("a", "b", "third", 0.3),
        ]);
        assert_eq!(phenotypes(&ranked), vec!["first", "second", "third"]);
    }
}
