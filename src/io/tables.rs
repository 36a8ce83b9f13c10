use crate::aggregation::{CellRecord, CellTable, PhenotypeSignature};
use crate::comparison::diffusion::{JobRecord, ProbabilityRecord};
use crate::config::PhenotypeColumn;
use crate::error::EngineError;
use crate::outcomes::OutcomeAssignment;
use anyhow::{Context, anyhow, bail};
use csv::{Reader, ReaderBuilder, StringRecord};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

pub const OUTCOME_COLUMN: &str = "outcome_assignment";

/// Tables supplied by the storage collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableName {
    Cells,
    FovLookup,
    TransitionProbabilities,
    JobMetadata,
}

impl TableName {
    pub const ALL: [TableName; 4] = [
        TableName::Cells,
        TableName::FovLookup,
        TableName::TransitionProbabilities,
        TableName::JobMetadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Cells => "cells",
            TableName::FovLookup => "fov_lookup",
            TableName::TransitionProbabilities => "transition_probabilities",
            TableName::JobMetadata => "job_metadata",
        }
    }

    /// Columns every file of this table must carry. Phenotype indicator
    /// columns of the cells table are named by the phenotype schema instead.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            TableName::Cells => &["sample_identifier", "compartment", "cell_area"],
            TableName::FovLookup => &["sample_identifier", "fov_index", "fov_string"],
            TableName::TransitionProbabilities => &[
                "transition_probability",
                "distance_type",
                "job_activity_id",
                "temporal_offset",
                "marker",
            ],
            TableName::JobMetadata => &[
                "Input file identifier",
                "Sample ID",
                "Job status",
                "Regional compartment",
                "job_activity_id",
                "distance_type",
            ],
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableName {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableName::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| EngineError::UnknownTable(s.to_string()))
    }
}

/// Tab for `.tsv`/`.txt` files, comma otherwise.
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("txt") => b'\t',
        _ => b',',
    }
}

fn open_reader(path: &Path, delimiter: u8) -> anyhow::Result<Reader<File>> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))
}

fn column_index(table: &str, headers: &StringRecord, column: &str) -> anyhow::Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| {
            EngineError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            }
            .into()
        })
}

fn check_columns(table: TableName, headers: &StringRecord) -> anyhow::Result<()> {
    for column in table.required_columns() {
        column_index(table.as_str(), headers, column)?;
    }
    Ok(())
}

/// Read a schema table into typed rows after checking its header.
pub fn read_table<T: DeserializeOwned>(table: TableName, path: &Path) -> anyhow::Result<Vec<T>> {
    let mut reader = open_reader(path, delimiter_for(path))?;
    check_columns(table, reader.headers()?)?;

    let mut rows = Vec::new();
    for (line, row) in reader.deserialize().enumerate() {
        let row: T = row.with_context(|| {
            format!("{}: malformed {} row {}", path.display(), table, line + 1)
        })?;
        rows.push(row);
    }
    debug!("Read {} rows of table {} from {}", rows.len(), table, path.display());
    Ok(rows)
}

pub fn read_transition_probabilities(path: &Path) -> anyhow::Result<Vec<ProbabilityRecord>> {
    read_table(TableName::TransitionProbabilities, path)
}

pub fn read_job_metadata(path: &Path) -> anyhow::Result<Vec<JobRecord>> {
    read_table(TableName::JobMetadata, path)
}

/// Sample identifier to outcome label, from a tab-delimited file with a header.
///
/// Only the first two columns are read; their header names are ignored.
pub fn read_outcomes(path: &Path) -> anyhow::Result<OutcomeAssignment> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut outcomes = OutcomeAssignment::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        match (record.get(0), record.get(1)) {
            (Some(sample), Some(label)) => outcomes.insert(sample.trim(), label.trim()),
            _ => bail!(
                "{}: outcome row {} needs a sample identifier and a label",
                path.display(),
                line + 1
            ),
        }
    }
    info!("Read outcomes for {} samples.", outcomes.len());
    Ok(outcomes)
}

#[derive(Debug, Deserialize)]
struct ComplexPhenotypeRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Positive markers", default)]
    positive: String,
    #[serde(rename = "Negative markers", default)]
    negative: String,
}

fn split_markers(field: &str) -> Vec<String> {
    field
        .split(';')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

/// Composite phenotype signatures; marker lists are `;`-separated.
pub fn read_complex_phenotypes(path: &Path) -> anyhow::Result<Vec<PhenotypeSignature>> {
    let mut reader = open_reader(path, delimiter_for(path))?;
    let mut signatures = Vec::new();
    for row in reader.deserialize() {
        let row: ComplexPhenotypeRow =
            row.with_context(|| format!("{}: malformed phenotype row", path.display()))?;
        signatures.push(PhenotypeSignature::composite(
            row.name,
            split_markers(&row.positive),
            split_markers(&row.negative),
        ));
    }
    Ok(signatures)
}

fn parse_indicator(field: &str) -> anyhow::Result<bool> {
    match field.trim() {
        "1" | "+" | "true" | "True" | "TRUE" => Ok(true),
        "0" | "-" | "" | "false" | "False" | "FALSE" => Ok(false),
        other => other
            .parse::<f64>()
            .map(|v| v != 0.0)
            .map_err(|_| anyhow!("'{}' is not a phenotype indicator", other)),
    }
}

/// Read the cells table and build its phenotype membership.
///
/// `columns` maps each elementary marker to its indicator column. When the
/// table has no `outcome_assignment` column, labels come from `outcomes`.
pub fn read_cells(
    path: &Path,
    columns: &[PhenotypeColumn],
    signatures: &[PhenotypeSignature],
    outcomes: &OutcomeAssignment,
) -> anyhow::Result<CellTable> {
    let table = TableName::Cells;
    let mut reader = open_reader(path, delimiter_for(path))?;
    let headers = reader.headers()?.clone();
    check_columns(table, &headers)?;

    let sample_index = column_index(table.as_str(), &headers, "sample_identifier")?;
    let compartment_index = column_index(table.as_str(), &headers, "compartment")?;
    let area_index = column_index(table.as_str(), &headers, "cell_area")?;
    let outcome_index = column_index(table.as_str(), &headers, OUTCOME_COLUMN).ok();
    if outcome_index.is_none() {
        debug!("No {} column in {}; using the outcomes table.", OUTCOME_COLUMN, path.display());
    }
    let marker_indices = columns
        .iter()
        .map(|c| column_index(table.as_str(), &headers, &c.column))
        .collect::<anyhow::Result<Vec<usize>>>()?;
    let markers: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();

    let mut cells = Vec::new();
    let mut indicators = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let field = |index: usize| record.get(index).unwrap_or("").trim();
        let sample_identifier = field(sample_index).to_string();
        let cell_area = field(area_index).parse::<f64>().with_context(|| {
            format!("{}: row {} has invalid cell_area", path.display(), line + 1)
        })?;
        let outcome_assignment = match outcome_index {
            Some(index) => field(index).to_string(),
            None => outcomes.label(&sample_identifier).to_string(),
        };
        let row = marker_indices
            .iter()
            .map(|&index| parse_indicator(field(index)))
            .collect::<anyhow::Result<Vec<bool>>>()
            .with_context(|| format!("{}: row {}", path.display(), line + 1))?;

        cells.push(CellRecord {
            sample_identifier,
            compartment: field(compartment_index).to_string(),
            cell_area,
            outcome_assignment,
        });
        indicators.push(row);
    }
    info!("Read {} cells from {}", cells.len(), path.display());

    CellTable::from_markers(cells, &markers, &indicators, signatures)
}
