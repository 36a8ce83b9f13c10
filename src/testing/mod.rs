use crate::testing::effect::{Effect, Extremum, effect_sign, extremum, multiplicative_effect};
use crate::testing::inference::InferenceResult;
use crate::testing::utils::{is_constant, mean, median};
use std::fmt;

pub mod effect;
pub mod inference;

pub mod utils;

/// Significance cut-off of the exported flag. Display thresholds are a separate concern.
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TestKind {
    /// Welch's unequal-variance t-test on group means
    TTest,
    /// Kruskal-Wallis H test on group medians
    KruskalWallis,
}

impl TestKind {
    pub const ALL: [TestKind; 2] = [TestKind::TTest, TestKind::KruskalWallis];

    pub fn label(&self) -> &'static str {
        match self {
            TestKind::TTest => "t-test",
            TestKind::KruskalWallis => "Kruskal-Wallis",
        }
    }

    /// The per-group statistic the test compares.
    pub fn summary_statistic(&self) -> SummaryStatistic {
        match self {
            TestKind::TTest => SummaryStatistic::Mean,
            TestKind::KruskalWallis => SummaryStatistic::Median,
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SummaryStatistic {
    Mean,
    Median,
}

impl SummaryStatistic {
    pub const ALL: [SummaryStatistic; 2] = [SummaryStatistic::Mean, SummaryStatistic::Median];

    pub fn label(&self) -> &'static str {
        match self {
            SummaryStatistic::Mean => "mean",
            SummaryStatistic::Median => "median",
        }
    }

    pub fn apply(&self, values: &[f64]) -> f64 {
        match self {
            SummaryStatistic::Mean => mean(values),
            SummaryStatistic::Median => median(values),
        }
    }
}

impl fmt::Display for SummaryStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One sample's scalar feature.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleValue {
    pub sample_identifier: String,
    pub value: f64,
}

impl SampleValue {
    pub fn new(sample_identifier: impl Into<String>, value: f64) -> Self {
        SampleValue {
            sample_identifier: sample_identifier.into(),
            value,
        }
    }
}

/// Statistics of one two-group comparison, independent of what was compared.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub kind: TestKind,
    /// Mean (t-test) or median (Kruskal-Wallis) of the first group
    pub tested_value1: f64,
    /// Mean (t-test) or median (Kruskal-Wallis) of the second group
    pub tested_value2: f64,
    pub statistic: f64,
    pub p_value: f64,
    pub absolute_effect: f64,
    pub multiplicative_effect: Effect,
    pub effect_sign: i8,
    pub significant: bool,
    pub extreme1: Extremum,
    pub extreme2: Extremum,
}

/// A test outcome placed in its comparison context; one exported row.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub outcome1: String,
    pub outcome2: String,
    pub phenotype: String,
    pub compartment: String,
    pub outcome: TestOutcome,
    /// Set for comparisons of per-sample summaries of diffusion values.
    pub temporal_offset: Option<f64>,
    pub distance_type: Option<String>,
    pub summarization: Option<SummaryStatistic>,
}

impl TestResult {
    pub fn new(
        outcome1: impl Into<String>,
        outcome2: impl Into<String>,
        phenotype: impl Into<String>,
        compartment: impl Into<String>,
        outcome: TestOutcome,
    ) -> Self {
        TestResult {
            outcome1: outcome1.into(),
            outcome2: outcome2.into(),
            phenotype: phenotype.into(),
            compartment: compartment.into(),
            outcome,
            temporal_offset: None,
            distance_type: None,
            summarization: None,
        }
    }

    pub fn with_temporal_offset(mut self, temporal_offset: f64) -> Self {
        self.temporal_offset = Some(temporal_offset);
        self
    }

    pub fn with_distance_type(mut self, distance_type: impl Into<String>) -> Self {
        self.distance_type = Some(distance_type.into());
        self
    }

    pub fn with_summarization(mut self, summarization: SummaryStatistic) -> Self {
        self.summarization = Some(summarization);
        self
    }

    pub fn is_significant(&self) -> bool {
        self.outcome.significant
    }

    pub fn p_value(&self) -> f64 {
        self.outcome.p_value
    }
}

/// Runs one test kind on two groups of per-sample values.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignificanceTester;

impl SignificanceTester {
    pub fn new() -> Self {
        SignificanceTester
    }

    /// Compare `values1` against `values2`.
    ///
    /// Returns `None` when either group is empty or constant; callers skip the
    /// combination.
    pub fn test(
        &self,
        values1: &[SampleValue],
        values2: &[SampleValue],
        kind: TestKind,
    ) -> Option<TestOutcome> {
        let x: Vec<f64> = values1.iter().map(|v| v.value).collect();
        let y: Vec<f64> = values2.iter().map(|v| v.value).collect();

        if is_degenerate(&x) || is_degenerate(&y) {
            return None;
        }

        let inference: InferenceResult = match kind {
            TestKind::TTest => inference::parametric::welch_t_test(&x, &y),
            TestKind::KruskalWallis => inference::nonparametric::kruskal_wallis(&[&x[..], &y[..]]),
        };
        if inference.p_value.is_nan() {
            return None;
        }

        let summary = kind.summary_statistic();
        let tested_value1 = summary.apply(&x);
        let tested_value2 = summary.apply(&y);
        let difference = tested_value2 - tested_value1;
        let sign = effect_sign(tested_value1, tested_value2);

        Some(TestOutcome {
            kind,
            tested_value1,
            tested_value2,
            statistic: inference.statistic,
            p_value: inference.p_value,
            absolute_effect: difference.abs(),
            multiplicative_effect: multiplicative_effect(tested_value1, tested_value2),
            effect_sign: sign,
            significant: inference.is_significant(SIGNIFICANCE_THRESHOLD),
            extreme1: extremum(values1, -sign),
            extreme2: extremum(values2, sign),
        })
    }
}

fn is_degenerate(values: &[f64]) -> bool {
    values.is_empty() || is_constant(values)
}
