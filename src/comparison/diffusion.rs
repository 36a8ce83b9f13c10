//! Distributional comparison of diffusion transition probabilities.

use crate::comparison::{Findings, require_outcome_pairs, test_both_kinds};
use crate::config::EngineConfig;
use crate::distribution::{
    DistanceMatrix, DistanceMatrixComputer, GroundCost, Histogram, HistogramBinner,
    HistogramConfig,
};
use crate::outcomes::OutcomeAssignment;
use crate::testing::utils::{is_constant, mean, median, population_variance};
use crate::testing::{SampleValue, SignificanceTester, SummaryStatistic, TestResult};
use log::{info, warn};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// One row of the transition-probabilities table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProbabilityRecord {
    pub transition_probability: f64,
    pub distance_type: String,
    pub job_activity_id: i64,
    pub temporal_offset: Option<f64>,
    pub marker: String,
}

/// One row of the job-metadata table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "Input file identifier")]
    pub input_file_identifier: String,
    #[serde(rename = "Sample ID")]
    pub sample_identifier: String,
    #[serde(rename = "Job status")]
    pub job_status: String,
    #[serde(rename = "Regional compartment")]
    pub compartment: String,
    pub job_activity_id: i64,
    pub distance_type: String,
}

/// Which jobs contribute observations.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFilter {
    pub job_status: String,
    /// `None` accepts every compartment.
    pub compartment: Option<String>,
}

impl Default for JobFilter {
    fn default() -> Self {
        JobFilter {
            job_status: "COMPLETE".to_string(),
            compartment: Some("nontumor".to_string()),
        }
    }
}

impl JobFilter {
    fn accepts(&self, job: &JobRecord) -> bool {
        job.job_status == self.job_status
            && self
                .compartment
                .as_ref()
                .is_none_or(|c| *c == job.compartment)
    }
}

/// A per-cell diffusion value with its sample context.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub sample_identifier: String,
    pub compartment: String,
    pub marker: String,
    pub distance_type: String,
    pub temporal_offset: Option<f64>,
    pub value: f64,
}

/// Result of joining probability rows to their jobs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinedObservations {
    pub observations: Vec<Observation>,
    /// Job ids referenced by probability rows but absent or filtered out, ascending.
    pub unmatched_job_ids: Vec<i64>,
}

/// Attach sample and compartment to each probability row through its job.
///
/// Rows whose job is unknown or rejected by `filter` are dropped and their job
/// ids reported instead of failing the lookup.
pub fn join_job_metadata(
    records: &[ProbabilityRecord],
    jobs: &[JobRecord],
    filter: &JobFilter,
) -> JoinedObservations {
    let accepted: BTreeMap<i64, &JobRecord> = jobs
        .iter()
        .filter(|job| filter.accepts(job))
        .map(|job| (job.job_activity_id, job))
        .collect();

    let mut unmatched = BTreeSet::new();
    let mut observations = Vec::with_capacity(records.len());
    for record in records {
        match accepted.get(&record.job_activity_id) {
            Some(job) => observations.push(Observation {
                sample_identifier: job.sample_identifier.clone(),
                compartment: job.compartment.clone(),
                marker: record.marker.clone(),
                distance_type: record.distance_type.clone(),
                temporal_offset: record.temporal_offset,
                value: record.transition_probability,
            }),
            None => {
                unmatched.insert(record.job_activity_id);
            }
        }
    }

    JoinedObservations {
        observations,
        unmatched_job_ids: unmatched.into_iter().collect(),
    }
}

/// Snap a temporal offset to three decimals when it is within 1e-5 of that value.
pub fn guess_round(t: f64) -> f64 {
    let r = (t * 1000.0).round() / 1000.0;
    if (t - r).abs() < 0.00001 { r } else { t }
}

/// Mean, median and variance of one sample's values at one temporal offset.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSummary {
    pub sample_identifier: String,
    pub outcome: String,
    pub compartment: String,
    pub marker: String,
    pub distance_type: String,
    pub temporal_offset: f64,
    pub mean: f64,
    pub median: f64,
    pub variance: f64,
}

impl SampleSummary {
    pub fn statistic(&self, statistic: SummaryStatistic) -> f64 {
        match statistic {
            SummaryStatistic::Mean => self.mean,
            SummaryStatistic::Median => self.median,
        }
    }
}

/// Distance matrix of one (compartment, marker, distance type, offset) case.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrixCase {
    pub compartment: String,
    pub marker: String,
    pub distance_type: String,
    pub temporal_offset: f64,
    /// Outcome label of each matrix row, `"unknown"` included.
    pub outcomes: Vec<String>,
    pub matrix: DistanceMatrix,
}

/// Receiver of distance matrices, typically a clustering or plotting layer.
pub trait DistanceMatrixSink {
    fn accept(&mut self, case: &DistanceMatrixCase) -> anyhow::Result<()>;
}

impl DistanceMatrixSink for Vec<DistanceMatrixCase> {
    fn accept(&mut self, case: &DistanceMatrixCase) -> anyhow::Result<()> {
        self.push(case.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionReport {
    pub summaries: Vec<SampleSummary>,
    pub distance_matrices: Vec<DistanceMatrixCase>,
    pub findings: Findings,
}

impl DiffusionReport {
    /// Hand every distance matrix, in enumeration order, to `sink`.
    pub fn deliver_to(&self, sink: &mut dyn DistanceMatrixSink) -> anyhow::Result<()> {
        for case in &self.distance_matrices {
            sink.accept(case)?;
        }
        Ok(())
    }
}

struct CaseOutput {
    summaries: Vec<SampleSummary>,
    matrix: Option<DistanceMatrixCase>,
    results: Vec<TestResult>,
}

type CaseKey = (String, String, String);

pub struct DiffusionComparison {
    binner: HistogramBinner,
    computer: DistanceMatrixComputer,
    tester: SignificanceTester,
}

impl DiffusionComparison {
    pub fn new(histogram: HistogramConfig, cost: GroundCost) -> anyhow::Result<Self> {
        Ok(DiffusionComparison {
            binner: HistogramBinner::new(histogram)?,
            computer: DistanceMatrixComputer::new(cost),
            tester: SignificanceTester::new(),
        })
    }

    pub fn from_config(config: &EngineConfig) -> anyhow::Result<Self> {
        DiffusionComparison::new(config.histogram_config(), config.diffusion.ground_cost)
    }

    /// Compare the distributions of every (compartment, marker, distance type,
    /// temporal offset) case.
    ///
    /// Each case yields per-sample summaries for samples with a known outcome,
    /// a distance matrix over the histograms of all samples whose values vary,
    /// and outcome tests on the per-sample mean and median.
    pub fn run(
        &self,
        observations: &[Observation],
        outcomes: &OutcomeAssignment,
    ) -> anyhow::Result<DiffusionReport> {
        let samples: BTreeSet<&str> = observations
            .iter()
            .map(|o| o.sample_identifier.as_str())
            .collect();
        let labels: Vec<String> = samples
            .iter()
            .map(|s| outcomes.label(s).to_string())
            .collect();
        let pairs = require_outcome_pairs(&labels)?;

        for sample in samples.iter().filter(|s| !outcomes.is_known(s)) {
            warn!(
                "Sample {} has no outcome assignment; it is left out of outcome tests.",
                sample
            );
        }

        let t_values = temporal_offsets(observations);
        info!(
            "Comparing {} observations over {} temporal offsets.",
            observations.len(),
            t_values.len()
        );

        // (compartment, marker, distance type) -> sample -> offset index -> values
        let mut grouped: BTreeMap<CaseKey, BTreeMap<&str, Vec<Vec<f64>>>> = BTreeMap::new();
        for o in observations {
            let Some(t) = o.temporal_offset.filter(|t| t.is_finite()).map(guess_round) else {
                continue;
            };
            let Ok(t_index) = t_values.binary_search_by(|v| v.total_cmp(&t)) else {
                continue;
            };
            let key = (o.compartment.clone(), o.marker.clone(), o.distance_type.clone());
            grouped
                .entry(key)
                .or_default()
                .entry(o.sample_identifier.as_str())
                .or_insert_with(|| vec![Vec::new(); t_values.len()])[t_index]
                .push(o.value);
        }

        let mut cases = Vec::new();
        for (key, by_sample) in &grouped {
            for t_index in 0..t_values.len() {
                cases.push((key, by_sample, t_index));
            }
        }

        let outputs: Vec<CaseOutput> = cases
            .par_iter()
            .map(|&(key, by_sample, t_index)| {
                self.compare_case(key, by_sample, t_index, t_values[t_index], outcomes, &pairs)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut summaries = Vec::new();
        let mut distance_matrices = Vec::new();
        let mut results = Vec::new();
        for output in outputs {
            summaries.extend(output.summaries);
            distance_matrices.extend(output.matrix);
            results.extend(output.results);
        }

        let findings = Findings::from_results(results);
        if findings.is_empty() {
            info!("No non-trivial tests to perform. Probably too few values.");
        }

        Ok(DiffusionReport {
            summaries,
            distance_matrices,
            findings,
        })
    }

    fn compare_case(
        &self,
        (compartment, marker, distance_type): &CaseKey,
        by_sample: &BTreeMap<&str, Vec<Vec<f64>>>,
        t_index: usize,
        t: f64,
        outcomes: &OutcomeAssignment,
        pairs: &[(String, String)],
    ) -> anyhow::Result<CaseOutput> {
        let mut summaries = Vec::new();
        let mut histograms: Vec<(String, Histogram)> = Vec::new();

        for (&sample, values_by_offset) in by_sample {
            let values = &values_by_offset[t_index];
            if values.is_empty() {
                continue;
            }
            if let Some(outcome) = outcomes.get(sample) {
                summaries.push(SampleSummary {
                    sample_identifier: sample.to_string(),
                    outcome: outcome.to_string(),
                    compartment: compartment.clone(),
                    marker: marker.clone(),
                    distance_type: distance_type.clone(),
                    temporal_offset: t,
                    mean: mean(values),
                    median: median(values),
                    variance: population_variance(values),
                });
            }
            if is_constant(values) {
                continue;
            }
            histograms.push((sample.to_string(), self.binner.bin(values)));
        }

        let matrix = self.computer.pairwise_distance(&histograms)?;
        let matrix = if matrix.len() <= 1 {
            warn!(
                "No distribution data in case {}, {}, {}, t={}",
                marker, distance_type, compartment, t
            );
            None
        } else {
            Some(DistanceMatrixCase {
                compartment: compartment.clone(),
                marker: marker.clone(),
                distance_type: distance_type.clone(),
                temporal_offset: t,
                outcomes: matrix
                    .sample_identifiers
                    .iter()
                    .map(|s| outcomes.label(s).to_string())
                    .collect(),
                matrix,
            })
        };

        let mut results = Vec::new();
        for statistic in SummaryStatistic::ALL {
            for pair in pairs {
                let group = |outcome: &str| -> Vec<SampleValue> {
                    summaries
                        .iter()
                        .filter(|s| s.outcome == outcome)
                        .map(|s| SampleValue::new(s.sample_identifier.clone(), s.statistic(statistic)))
                        .collect()
                };
                results.extend(
                    test_both_kinds(
                        &self.tester,
                        pair,
                        marker,
                        compartment,
                        &group(&pair.0),
                        &group(&pair.1),
                    )
                    .into_iter()
                    .map(|r| {
                        r.with_temporal_offset(t)
                            .with_distance_type(distance_type.clone())
                            .with_summarization(statistic)
                    }),
                );
            }
        }

        Ok(CaseOutput {
            summaries,
            matrix,
            results,
        })
    }
}

/// Distinct rounded temporal offsets in ascending order; absent offsets are skipped.
pub fn temporal_offsets(observations: &[Observation]) -> Vec<f64> {
    let mut t_values: Vec<f64> = observations
        .iter()
        .filter_map(|o| o.temporal_offset)
        .filter(|t| t.is_finite())
        .map(guess_round)
        .collect();
    t_values.sort_by(f64::total_cmp);
    t_values.dedup();
    t_values
}
