use crate::aggregation::{AggregatedTable, CellTable, FeatureAggregator, Normalization};
use crate::comparison::{Findings, require_outcome_pairs, test_both_kinds};
use crate::testing::{SampleValue, SignificanceTester, TestResult};
use log::info;
use rayon::prelude::*;

/// Outcome tests on normalized phenotype areas.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyComparison {
    aggregator: FeatureAggregator,
    tester: SignificanceTester,
}

impl FrequencyComparison {
    pub fn new(normalization: Normalization) -> Self {
        FrequencyComparison {
            aggregator: FeatureAggregator::new(normalization),
            tester: SignificanceTester::new(),
        }
    }

    /// Aggregate cell areas, then test every compartment, outcome pair and
    /// phenotype with both test kinds.
    pub fn run(&self, table: &CellTable) -> anyhow::Result<Findings> {
        let labels: Vec<String> = table
            .cells()
            .iter()
            .map(|c| c.outcome_assignment.clone())
            .collect();
        require_outcome_pairs(&labels)?;

        info!("Starting stats.");
        let aggregated = self.aggregator.aggregate(table)?;
        self.compare(&aggregated)
    }

    pub fn compare(&self, aggregated: &AggregatedTable) -> anyhow::Result<Findings> {
        let pairs = require_outcome_pairs(&aggregated.outcomes())?;
        let compartments = aggregated.compartments();

        let mut cases = Vec::new();
        for compartment in &compartments {
            for pair in &pairs {
                for phenotype in 0..aggregated.phenotypes.len() {
                    cases.push((compartment, pair, phenotype));
                }
            }
        }

        let per_case: Vec<Vec<TestResult>> = cases
            .par_iter()
            .map(|&(compartment, pair, phenotype)| {
                let group = |outcome: &str| -> Vec<SampleValue> {
                    aggregated
                        .rows
                        .iter()
                        .filter(|r| r.compartment == *compartment && r.outcome_assignment == outcome)
                        .map(|r| SampleValue::new(r.sample_identifier.clone(), r.normalized[phenotype]))
                        .collect()
                };
                test_both_kinds(
                    &self.tester,
                    pair,
                    &aggregated.phenotypes[phenotype],
                    compartment,
                    &group(&pair.0),
                    &group(&pair.1),
                )
            })
            .collect();

        let findings = Findings::from_results(per_case.into_iter().flatten().collect());
        if findings.is_empty() {
            info!("No non-trivial tests to perform. Probably too few values.");
        } else {
            info!("{} test results generated.", findings.results().len());
        }
        Ok(findings)
    }
}
