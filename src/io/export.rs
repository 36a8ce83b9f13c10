use crate::aggregation::Normalization;
use crate::comparison::{DiffusionReport, Findings};
use crate::comparison::diffusion::SampleSummary;
use crate::testing::TestResult;
use anyhow::Context;
use csv::{Writer, WriterBuilder};
use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const FREQUENCY_TESTS_FILE: &str = "phenotype_frequency_tests.csv";
pub const FREQUENCY_BALANCED_TESTS_FILE: &str = "phenotype_frequency_balanced_tests.csv";
pub const DIFFUSION_TESTS_FILE: &str = "diffusion_distance_tests.csv";
pub const SUMMARIES_FILE: &str = "transition_probabilities_summarized.csv";

pub const RESULT_COLUMNS: [&str; 16] = [
    "outcome 1",
    "outcome 2",
    "phenotype",
    "compartment",
    "tested value 1",
    "tested value 2",
    "test",
    "p-value",
    "absolute effect",
    "multiplicative effect",
    "effect sign",
    "p-value < 0.01",
    "extreme sample 1",
    "extreme sample 2",
    "extreme value 1",
    "extreme value 2",
];

pub const DIFFUSION_COLUMNS: [&str; 3] = [
    "temporal offset",
    "distance type",
    "first-summarization statistic tested",
];

pub fn frequency_tests_filename(normalization: Normalization) -> &'static str {
    match normalization {
        Normalization::Compartmental => FREQUENCY_TESTS_FILE,
        Normalization::Balanced => FREQUENCY_BALANCED_TESTS_FILE,
    }
}

fn result_fields(result: &TestResult) -> Vec<String> {
    let outcome = &result.outcome;
    vec![
        result.outcome1.clone(),
        result.outcome2.clone(),
        result.phenotype.clone(),
        result.compartment.clone(),
        outcome.tested_value1.to_string(),
        outcome.tested_value2.to_string(),
        outcome.kind.to_string(),
        outcome.p_value.to_string(),
        outcome.absolute_effect.to_string(),
        outcome.multiplicative_effect.to_string(),
        outcome.effect_sign.to_string(),
        outcome.significant.to_string(),
        outcome.extreme1.sample_identifier.clone(),
        outcome.extreme2.sample_identifier.clone(),
        outcome.extreme1.value.to_string(),
        outcome.extreme2.value.to_string(),
    ]
}

fn diffusion_fields(result: &TestResult) -> Vec<String> {
    let mut fields = result_fields(result);
    fields.push(result.temporal_offset.map(|t| t.to_string()).unwrap_or_default());
    fields.push(result.distance_type.clone().unwrap_or_default());
    fields.push(
        result
            .summarization
            .map(|s| s.label().to_string())
            .unwrap_or_default(),
    );
    fields
}

fn create_writer(path: &Path) -> anyhow::Result<Writer<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))
}

/// Write result rows, in the given order, with the standard column set.
pub fn write_results(path: &Path, results: &[TestResult]) -> anyhow::Result<()> {
    let mut writer = create_writer(path)?;
    writer.write_record(RESULT_COLUMNS)?;
    for result in results {
        writer.write_record(result_fields(result))?;
    }
    writer.flush()?;
    Ok(())
}

/// Like [`write_results`], followed by the temporal offset, distance type and
/// summarization columns.
pub fn write_diffusion_results(path: &Path, results: &[TestResult]) -> anyhow::Result<()> {
    let mut writer = create_writer(path)?;
    writer.write_record(RESULT_COLUMNS.iter().chain(DIFFUSION_COLUMNS.iter()))?;
    for result in results {
        writer.write_record(diffusion_fields(result))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    #[serde(rename = "Sample ID")]
    sample_identifier: &'a str,
    outcome_assignment: &'a str,
    compartment: &'a str,
    marker: &'a str,
    distance_type: &'a str,
    temporal_offset: f64,
    mean: f64,
    median: f64,
    variance: f64,
}

pub fn write_summaries(path: &Path, summaries: &[SampleSummary]) -> anyhow::Result<()> {
    let mut writer = create_writer(path)?;
    for s in summaries {
        writer.serialize(SummaryRow {
            sample_identifier: &s.sample_identifier,
            outcome_assignment: &s.outcome,
            compartment: &s.compartment,
            marker: &s.marker,
            distance_type: &s.distance_type,
            temporal_offset: s.temporal_offset,
            mean: s.mean,
            median: s.median,
            variance: s.variance,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Write frequency findings under `output_path`; `None` when there was nothing to write.
pub fn export_frequency_findings(
    findings: &Findings,
    output_path: &Path,
    normalization: Normalization,
) -> anyhow::Result<Option<PathBuf>> {
    let results = match findings {
        Findings::Results(results) => results,
        Findings::NoFindings => {
            info!("No test results to export.");
            return Ok(None);
        }
    };
    let path = output_path.join(frequency_tests_filename(normalization));
    write_results(&path, results)?;
    info!("Wrote {} test results to {}", results.len(), path.display());
    Ok(Some(path))
}

/// Write the per-sample summaries and, when present, the outcome tests.
pub fn export_diffusion_report(
    report: &DiffusionReport,
    output_path: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let path = output_path.join(SUMMARIES_FILE);
    write_summaries(&path, &report.summaries)?;
    info!("Wrote {} sample summaries to {}", report.summaries.len(), path.display());
    written.push(path);

    match &report.findings {
        Findings::Results(results) => {
            let path = output_path.join(DIFFUSION_TESTS_FILE);
            write_diffusion_results(&path, results)?;
            info!("Wrote {} test results to {}", results.len(), path.display());
            written.push(path);
        }
        Findings::NoFindings => info!("No test results to export."),
    }
    Ok(written)
}
