//! Reduction of per-cell areas to one normalized feature per
//! (sample, compartment, phenotype).

pub mod phenotype;

use crate::error::EngineError;
use log::debug;
use nalgebra_sparse::CsrMatrix;
use std::collections::BTreeMap;

pub use phenotype::{PhenotypeSignature, membership_matrix};

#[derive(Debug, Clone, PartialEq)]
pub struct CellRecord {
    pub sample_identifier: String,
    pub compartment: String,
    pub cell_area: f64,
    pub outcome_assignment: String,
}

/// Cells with their phenotype memberships.
#[derive(Debug, Clone)]
pub struct CellTable {
    cells: Vec<CellRecord>,
    phenotypes: Vec<String>,
    membership: CsrMatrix<f64>,
}

impl CellTable {
    /// `membership` must have one row per cell and one column per phenotype.
    pub fn new(
        cells: Vec<CellRecord>,
        phenotypes: Vec<String>,
        membership: CsrMatrix<f64>,
    ) -> anyhow::Result<Self> {
        if membership.nrows() != cells.len() || membership.ncols() != phenotypes.len() {
            return Err(anyhow::anyhow!(
                "Membership matrix is {}x{}, expected {}x{}",
                membership.nrows(),
                membership.ncols(),
                cells.len(),
                phenotypes.len()
            ));
        }
        Ok(CellTable {
            cells,
            phenotypes,
            membership,
        })
    }

    /// Build from raw marker indicators, deriving membership for every signature.
    pub fn from_markers(
        cells: Vec<CellRecord>,
        markers: &[String],
        indicators: &[Vec<bool>],
        signatures: &[PhenotypeSignature],
    ) -> anyhow::Result<Self> {
        if indicators.len() != cells.len() {
            return Err(anyhow::anyhow!(
                "{} indicator rows given for {} cells",
                indicators.len(),
                cells.len()
            ));
        }
        let membership = membership_matrix(markers, indicators, signatures)?;
        let phenotypes = signatures.iter().map(|s| s.name.clone()).collect();
        CellTable::new(cells, phenotypes, membership)
    }

    pub fn cells(&self) -> &[CellRecord] {
        &self.cells
    }

    pub fn phenotypes(&self) -> &[String] {
        &self.phenotypes
    }

    pub fn membership(&self) -> &CsrMatrix<f64> {
        &self.membership
    }
}

/// Denominator used to normalize phenotype areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Total cell area of the sample within the same compartment
    #[default]
    Compartmental,
    /// Total cell area of the sample across all compartments
    Balanced,
}

/// Features of one (sample, compartment) group; vectors follow the table's phenotype order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedFeatures {
    pub sample_identifier: String,
    pub compartment: String,
    pub outcome_assignment: String,
    pub area_sums: Vec<f64>,
    pub denominator: f64,
    pub normalized: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedTable {
    pub phenotypes: Vec<String>,
    /// Ordered by (sample identifier, compartment).
    pub rows: Vec<AggregatedFeatures>,
}

impl AggregatedTable {
    pub fn compartments(&self) -> Vec<String> {
        let mut compartments: Vec<String> = self.rows.iter().map(|r| r.compartment.clone()).collect();
        compartments.sort();
        compartments.dedup();
        compartments
    }

    pub fn outcomes(&self) -> Vec<String> {
        let mut outcomes: Vec<String> = self
            .rows
            .iter()
            .map(|r| r.outcome_assignment.clone())
            .collect();
        outcomes.sort();
        outcomes.dedup();
        outcomes
    }

    pub fn get(&self, sample_identifier: &str, compartment: &str) -> Option<&AggregatedFeatures> {
        self.rows
            .iter()
            .find(|r| r.sample_identifier == sample_identifier && r.compartment == compartment)
    }
}

struct Accumulator {
    outcome_assignment: String,
    area_sums: Vec<f64>,
    total_area: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureAggregator {
    normalization: Normalization,
}

impl FeatureAggregator {
    pub fn new(normalization: Normalization) -> Self {
        FeatureAggregator { normalization }
    }

    /// Sum member cell areas per phenotype and divide by the shared denominator.
    ///
    /// Phenotypes may overlap, so the normalized values of a group need not sum
    /// to one. A zero denominator yields zero for every phenotype.
    pub fn aggregate(&self, table: &CellTable) -> anyhow::Result<AggregatedTable> {
        let n_phenotypes = table.phenotypes.len();
        let mut groups: BTreeMap<(String, String), Accumulator> = BTreeMap::new();

        for (cell, row) in table.cells.iter().zip(table.membership.row_iter()) {
            let key = (cell.sample_identifier.clone(), cell.compartment.clone());
            let group = groups.entry(key).or_insert_with(|| Accumulator {
                outcome_assignment: cell.outcome_assignment.clone(),
                area_sums: vec![0.0; n_phenotypes],
                total_area: 0.0,
            });

            if group.outcome_assignment != cell.outcome_assignment {
                return Err(EngineError::InconsistentOutcome {
                    sample_identifier: cell.sample_identifier.clone(),
                    compartment: cell.compartment.clone(),
                    first: group.outcome_assignment.clone(),
                    conflicting: cell.outcome_assignment.clone(),
                }
                .into());
            }

            group.total_area += cell.cell_area;
            for &phenotype in row.col_indices() {
                group.area_sums[phenotype] += cell.cell_area;
            }
        }

        let mut sample_totals: BTreeMap<&str, f64> = BTreeMap::new();
        if self.normalization == Normalization::Balanced {
            for ((sample, _), group) in &groups {
                *sample_totals.entry(sample.as_str()).or_insert(0.0) += group.total_area;
            }
        }

        let rows = groups
            .iter()
            .map(|((sample, compartment), group)| {
                let denominator = match self.normalization {
                    Normalization::Compartmental => group.total_area,
                    Normalization::Balanced => {
                        sample_totals.get(sample.as_str()).copied().unwrap_or(0.0)
                    }
                };
                debug!(
                    "Normalization factor for sample {} in compartment {}: {}",
                    sample, compartment, denominator
                );
                let normalized = group
                    .area_sums
                    .iter()
                    .map(|&sum| if denominator == 0.0 { 0.0 } else { sum / denominator })
                    .collect();
                AggregatedFeatures {
                    sample_identifier: sample.clone(),
                    compartment: compartment.clone(),
                    outcome_assignment: group.outcome_assignment.clone(),
                    area_sums: group.area_sums.clone(),
                    denominator,
                    normalized,
                }
            })
            .collect();

        Ok(AggregatedTable {
            phenotypes: table.phenotypes.clone(),
            rows,
        })
    }
}
