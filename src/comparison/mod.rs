//! Enumeration of outcome comparisons and ranking of their results.
//!
//! Two pathways share the enumeration and ranking rules:
//!
//! - **[`frequency`]**: normalized phenotype areas per (sample, compartment)
//! - **[`diffusion`]**: distributions of per-cell diffusion values, compared
//!   through histograms, transport distances and per-sample summaries

pub mod diffusion;
pub mod frequency;
pub mod ranking;

use crate::error::EngineError;
use crate::outcomes::UNKNOWN_OUTCOME;
use crate::testing::{SampleValue, SignificanceTester, TestKind, TestResult};

pub use diffusion::{DiffusionComparison, DiffusionReport, DistanceMatrixCase, DistanceMatrixSink};
pub use frequency::FrequencyComparison;
pub use ranking::rank_results;

/// Ranked results of a run, or the explicit absence of any.
#[derive(Debug, Clone, PartialEq)]
pub enum Findings {
    Results(Vec<TestResult>),
    /// Every comparison was degenerate.
    NoFindings,
}

impl Findings {
    /// Rank `results` into export order.
    pub fn from_results(results: Vec<TestResult>) -> Self {
        if results.is_empty() {
            Findings::NoFindings
        } else {
            Findings::Results(rank_results(results))
        }
    }

    pub fn results(&self) -> &[TestResult] {
        match self {
            Findings::Results(results) => results,
            Findings::NoFindings => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Findings::NoFindings)
    }
}

/// Unordered pairs of distinct known labels, each pair in lexicographic order.
pub fn outcome_pairs(labels: &[String]) -> Vec<(String, String)> {
    let mut known: Vec<&String> = labels.iter().filter(|l| *l != UNKNOWN_OUTCOME).collect();
    known.sort();
    known.dedup();

    let mut pairs = Vec::new();
    for (i, first) in known.iter().enumerate() {
        for second in &known[i + 1..] {
            pairs.push(((*first).clone(), (*second).clone()));
        }
    }
    pairs
}

/// Outcome pairs for a run; a run without any pair is a configuration error.
pub fn require_outcome_pairs(labels: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    let pairs = outcome_pairs(labels);
    if pairs.is_empty() {
        let mut available: Vec<String> = labels.to_vec();
        available.sort();
        available.dedup();
        return Err(EngineError::MissingOutcomeDimension { available }.into());
    }
    Ok(pairs)
}

/// Both test kinds on one pair of groups, skipping degenerate kinds.
pub(crate) fn test_both_kinds(
    tester: &SignificanceTester,
    pair: &(String, String),
    phenotype: &str,
    compartment: &str,
    values1: &[SampleValue],
    values2: &[SampleValue],
) -> Vec<TestResult> {
    TestKind::ALL
        .iter()
        .filter_map(|&kind| tester.test(values1, values2, kind))
        .map(|outcome| TestResult::new(&pair.0, &pair.1, phenotype, compartment, outcome))
        .collect()
}
